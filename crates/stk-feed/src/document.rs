//! Arena-backed XML tree.
//!
//! Every node lives in one `Vec` owned by the [`Document`]; parents refer to
//! children by [`NodeId`]. Product indexes hold `NodeId`s rather than
//! references, so the tree can be mutated while the index is alive.
//!
//! Nodes detached by [`Document::set_text`] stay in the arena but are no
//! longer reachable from the root and are never rendered.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::FeedError;

/// Stable index of a node inside its [`Document`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) const fn new(index: usize) -> Self {
        NodeId(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Unescaped attribute values, in source order.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<NodeId>,
}

impl Element {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Unescaped character data.
    Text(String),
    CData(String),
    Comment(String),
    /// Processing instruction body (target and data), verbatim.
    Instruction(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Parse UTF-8 XML bytes (an optional byte-order mark is skipped).
    ///
    /// Whitespace is preserved exactly. The prolog (declaration, doctype,
    /// comments outside the root) is not retained.
    pub fn parse(bytes: &[u8]) -> Result<Document, FeedError> {
        let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
        let src = std::str::from_utf8(bytes)
            .map_err(|e| FeedError::InvalidFormat(format!("input is not UTF-8: {e}")))?;

        let mut reader = Reader::from_str(src);
        reader.check_end_names(true);

        let mut nodes: Vec<Node> = Vec::new();
        let mut root: Option<NodeId> = None;
        let mut open: Vec<NodeId> = Vec::new();

        loop {
            let pos = reader.buffer_position();
            let event = reader
                .read_event()
                .map_err(|e| FeedError::InvalidFormat(format!("at byte {pos}: {e}")))?;

            match event {
                Event::Start(e) => {
                    let el = element_from_start(&e)?;
                    let id = push_node(&mut nodes, Node::Element(el));
                    attach_element(&mut nodes, &mut root, &open, id)?;
                    open.push(id);
                }
                Event::Empty(e) => {
                    let el = element_from_start(&e)?;
                    let id = push_node(&mut nodes, Node::Element(el));
                    attach_element(&mut nodes, &mut root, &open, id)?;
                }
                Event::End(_) => {
                    open.pop();
                }
                Event::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|e| FeedError::InvalidFormat(format!("at byte {pos}: {e}")))?;
                    match open.last() {
                        Some(&parent) => {
                            let id = push_node(&mut nodes, Node::Text(text.into_owned()));
                            append_child(&mut nodes, parent, id);
                        }
                        None if text.trim().is_empty() => {}
                        None => {
                            return Err(FeedError::InvalidFormat(format!(
                                "at byte {pos}: text outside the root element"
                            )))
                        }
                    }
                }
                Event::CData(e) => {
                    let text = String::from_utf8(e.into_inner().into_owned())
                        .map_err(|e| FeedError::InvalidFormat(e.to_string()))?;
                    match open.last() {
                        Some(&parent) => {
                            let id = push_node(&mut nodes, Node::CData(text));
                            append_child(&mut nodes, parent, id);
                        }
                        None => {
                            return Err(FeedError::InvalidFormat(format!(
                                "at byte {pos}: CDATA outside the root element"
                            )))
                        }
                    }
                }
                Event::Comment(e) => {
                    if let Some(&parent) = open.last() {
                        let id = push_node(&mut nodes, Node::Comment(utf8(&e)?));
                        append_child(&mut nodes, parent, id);
                    }
                }
                Event::PI(e) => {
                    if let Some(&parent) = open.last() {
                        let id = push_node(&mut nodes, Node::Instruction(utf8(&e)?));
                        append_child(&mut nodes, parent, id);
                    }
                }
                Event::Decl(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        if let Some(&unclosed) = open.last() {
            let name = match &nodes[unclosed.0] {
                Node::Element(el) => el.name.clone(),
                _ => String::new(),
            };
            return Err(FeedError::InvalidFormat(format!(
                "unexpected end of input: <{name}> is not closed"
            )));
        }

        let root = root.ok_or_else(|| FeedError::InvalidFormat("no root element".to_string()))?;
        Ok(Document { nodes, root })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.nodes.get(id.0) {
            Some(Node::Element(el)) => Some(el),
            _ => None,
        }
    }

    /// Tag name of an element node.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name.as_str())
    }

    /// Direct element children in document order.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.element(id)
            .map(|el| el.children.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
    }

    /// First direct child element named `name`.
    pub fn find_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.child_elements(id)
            .find(|&c| self.name(c) == Some(name))
    }

    /// Character data that directly follows the start tag (text and CDATA up
    /// to the first non-text child). `None` when there is none, as for
    /// `<stok/>` or `<stok></stok>`.
    pub fn text(&self, id: NodeId) -> Option<String> {
        let el = self.element(id)?;
        let mut out: Option<String> = None;
        for &c in &el.children {
            match &self.nodes[c.0] {
                Node::Text(t) | Node::CData(t) => out.get_or_insert_with(String::new).push_str(t),
                _ => break,
            }
        }
        out
    }

    /// Text of the first child element named `name`.
    pub fn child_text(&self, id: NodeId, name: &str) -> Option<String> {
        self.find_child(id, name).and_then(|c| self.text(c))
    }

    /// Replace the leading character data of an element with `text`.
    /// Child elements, comments and any text after them are kept.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        let leading = match self.element(id) {
            Some(el) => el
                .children
                .iter()
                .take_while(|c| matches!(self.nodes[c.0], Node::Text(_) | Node::CData(_)))
                .count(),
            None => return,
        };
        let text_id = push_node(&mut self.nodes, Node::Text(text.into()));
        if let Node::Element(el) = &mut self.nodes[id.0] {
            el.children.drain(..leading);
            el.children.insert(0, text_id);
        }
    }

    /// Append a new empty element as the last child of `parent`.
    pub fn append_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = push_node(&mut self.nodes, Node::Element(Element::new(name)));
        append_child(&mut self.nodes, parent, id);
        id
    }
}

fn push_node(nodes: &mut Vec<Node>, node: Node) -> NodeId {
    nodes.push(node);
    NodeId::new(nodes.len() - 1)
}

fn append_child(nodes: &mut [Node], parent: NodeId, child: NodeId) {
    if let Some(Node::Element(el)) = nodes.get_mut(parent.0) {
        el.children.push(child);
    }
}

fn attach_element(
    nodes: &mut [Node],
    root: &mut Option<NodeId>,
    open: &[NodeId],
    id: NodeId,
) -> Result<(), FeedError> {
    match (open.last(), *root) {
        (Some(&parent), _) => {
            append_child(nodes, parent, id);
            Ok(())
        }
        (None, None) => {
            *root = Some(id);
            Ok(())
        }
        (None, Some(_)) => Err(FeedError::InvalidFormat(
            "more than one root element".to_string(),
        )),
    }
}

fn element_from_start(e: &quick_xml::events::BytesStart<'_>) -> Result<Element, FeedError> {
    let mut el = Element::new(utf8(e.name().as_ref())?);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| FeedError::InvalidFormat(e.to_string()))?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr
            .unescape_value()
            .map_err(|e| FeedError::InvalidFormat(e.to_string()))?;
        el.attributes.push((key, value.into_owned()));
    }
    Ok(el)
}

fn utf8(bytes: &[u8]) -> Result<String, FeedError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| FeedError::InvalidFormat(e.to_string()))
}
