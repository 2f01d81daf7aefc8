use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::{Document, FeedError, Node, NodeId};

/// Serialize a document as UTF-8 XML with a declaration.
///
/// Elements, attributes, text, CDATA, comments and processing instructions
/// inside the root are written back in their original order. Elements
/// without children are written self-closed.
pub fn render_xml(doc: &Document) -> Result<Vec<u8>, FeedError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(render_err)?;
    writer.get_mut().push(b'\n');
    write_node(&mut writer, doc, doc.root())?;
    Ok(writer.into_inner())
}

fn write_node(writer: &mut Writer<Vec<u8>>, doc: &Document, id: NodeId) -> Result<(), FeedError> {
    let Some(node) = doc.node(id) else {
        return Ok(());
    };

    let event = match node {
        Node::Element(el) => {
            let mut start = BytesStart::new(el.name.as_str());
            for (k, v) in &el.attributes {
                start.push_attribute((k.as_str(), v.as_str()));
            }
            if el.children.is_empty() {
                return writer.write_event(Event::Empty(start)).map_err(render_err);
            }
            writer.write_event(Event::Start(start)).map_err(render_err)?;
            for &child in &el.children {
                write_node(writer, doc, child)?;
            }
            Event::End(BytesEnd::new(el.name.as_str()))
        }
        Node::Text(t) => Event::Text(BytesText::new(t)),
        Node::CData(t) => Event::CData(BytesCData::new(t.as_str())),
        Node::Comment(t) => Event::Comment(BytesText::from_escaped(t.as_str())),
        Node::Instruction(t) => Event::PI(BytesText::from_escaped(t.as_str())),
    };
    writer.write_event(event).map_err(render_err)
}

fn render_err(e: impl std::fmt::Display) -> FeedError {
    FeedError::Render(e.to_string())
}
