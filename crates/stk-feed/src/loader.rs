use bigdecimal::BigDecimal;
use tracing::{debug, warn};

use crate::product::{BARCODE_TAG, NAME_TAG, PRODUCT_TAG, ROOT_TAG, STOCK_TAG};
use crate::quantity::quantity_or_zero;
use crate::{Document, FeedError, KeyField, NodeId, ProductIndex, ProductRecord};

/// Non-fatal observation made while loading. Also emitted as a `warn!` event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedDiagnostic {
    /// `<stok>` text was not a number; the product was loaded with stock 0.
    MalformedQuantity { key: String, raw: String },
}

/// A parsed feed: the tree (kept for later mutation and rendering) plus the
/// product index built over it.
#[derive(Clone, Debug)]
pub struct LoadedFeed {
    pub document: Document,
    pub products: ProductIndex,
    pub diagnostics: Vec<FeedDiagnostic>,
}

/// Validate `key_field` and then [`load`].
///
/// An unknown selector fails with [`FeedError::InvalidArgument`] before any
/// byte of `bytes` is looked at.
pub fn load_with_key(bytes: &[u8], key_field: &str) -> Result<LoadedFeed, FeedError> {
    let key_field = KeyField::parse(key_field)?;
    load(bytes, key_field)
}

/// Parse a feed and index its products by `key_field`.
///
/// - Malformed XML => [`FeedError::InvalidFormat`]
/// - Root other than `<urunler>` => [`FeedError::StructuralMismatch`]
/// - `<urun>` without a usable key => skipped (left in the tree, not indexed)
/// - Missing `<stok>` => stock 0
/// - Non-numeric `<stok>` => stock 0 plus a [`FeedDiagnostic`]
pub fn load(bytes: &[u8], key_field: KeyField) -> Result<LoadedFeed, FeedError> {
    let document = Document::parse(bytes)?;
    let root = document.root();
    let root_name = document.name(root).unwrap_or_default();
    if root_name != ROOT_TAG {
        return Err(FeedError::StructuralMismatch {
            expected: ROOT_TAG,
            found: root_name.to_string(),
        });
    }

    let mut products = ProductIndex::new();
    let mut diagnostics = Vec::new();
    let mut skipped = 0usize;

    let product_nodes: Vec<NodeId> = document
        .child_elements(root)
        .filter(|&id| document.name(id) == Some(PRODUCT_TAG))
        .collect();

    for node in product_nodes {
        let Some(key) = trimmed_child_text(&document, node, key_field.tag()) else {
            skipped += 1;
            continue;
        };

        let stock_text = document.child_text(node, STOCK_TAG);
        let (stock, malformed) = quantity_or_zero(stock_text.as_deref());
        if let Some(bad) = malformed {
            warn!(key = %key, raw = %bad.raw, "non-numeric stock value, using 0");
            diagnostics.push(FeedDiagnostic::MalformedQuantity {
                key: key.clone(),
                raw: bad.raw,
            });
        }

        let record = ProductRecord {
            barcode: trimmed_child_text(&document, node, BARCODE_TAG),
            name: trimmed_child_text(&document, node, NAME_TAG),
            key,
            stock,
            node,
        };
        if let Some(prev) = products.insert(record) {
            debug!(key = %prev.key, "duplicate product key, later entry wins");
        }
    }

    debug!(
        key_field = %key_field,
        indexed = products.len(),
        skipped,
        "feed loaded"
    );

    Ok(LoadedFeed {
        document,
        products,
        diagnostics,
    })
}

impl LoadedFeed {
    /// Stock of `key`, if indexed.
    pub fn stock_of(&self, key: &str) -> Option<BigDecimal> {
        self.products.get(key).map(|r| r.stock.clone())
    }
}

fn trimmed_child_text(doc: &Document, node: NodeId, tag: &str) -> Option<String> {
    doc.child_text(node, tag)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::Zero;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urunler>
  <urun><stokKodu>SK-1</stokKodu><barkod> 123 </barkod><stok>5</stok><urunAdi>Kalem</urunAdi></urun>
  <urun><stokKodu>SK-2</stokKodu><stok>N/A</stok></urun>
  <urun><barkod>   </barkod><stok>4</stok></urun>
  <kategori><barkod>999</barkod></kategori>
</urunler>"#;

    #[test]
    fn indexes_by_barcode_and_skips_keyless() {
        let feed = load(FEED.as_bytes(), KeyField::Barcode).unwrap();
        assert_eq!(feed.products.keys().collect::<Vec<_>>(), ["123"]);

        let rec = feed.products.get("123").unwrap();
        assert_eq!(rec.stock, BigDecimal::from(5));
        assert_eq!(rec.barcode.as_deref(), Some("123"));
        assert_eq!(rec.name.as_deref(), Some("Kalem"));
        assert_eq!(feed.document.name(rec.node), Some("urun"));
    }

    #[test]
    fn indexes_by_stock_code() {
        let feed = load(FEED.as_bytes(), KeyField::StockCode).unwrap();
        assert_eq!(feed.products.keys().collect::<Vec<_>>(), ["SK-1", "SK-2"]);
        assert_eq!(feed.stock_of("SK-2"), Some(BigDecimal::zero()));
        assert_eq!(feed.products.get("SK-2").unwrap().barcode, None);
    }

    #[test]
    fn malformed_stock_is_a_diagnostic_not_an_error() {
        let feed = load(FEED.as_bytes(), KeyField::StockCode).unwrap();
        assert_eq!(
            feed.diagnostics,
            vec![FeedDiagnostic::MalformedQuantity {
                key: "SK-2".to_string(),
                raw: "N/A".to_string(),
            }]
        );
    }

    #[test]
    fn wrong_root_is_structural_mismatch() {
        let err = load(b"<products><urun/></products>", KeyField::Barcode).unwrap_err();
        assert_eq!(
            err,
            FeedError::StructuralMismatch {
                expected: "urunler",
                found: "products".to_string(),
            }
        );
    }

    #[test]
    fn broken_xml_is_invalid_format() {
        let err = load(b"<urunler><urun></urunler>", KeyField::Barcode).unwrap_err();
        assert!(matches!(err, FeedError::InvalidFormat(_)));
    }

    #[test]
    fn invalid_key_field_rejected_before_parsing() {
        // The bytes are not even XML; the selector check must come first.
        let err = load_with_key(b"\xFF not xml", "sku").unwrap_err();
        assert_eq!(err, FeedError::InvalidArgument("sku".to_string()));
    }

    #[test]
    fn missing_stock_element_is_zero() {
        let feed = load(b"<urunler><urun><barkod>1</barkod></urun></urunler>", KeyField::Barcode)
            .unwrap();
        assert_eq!(feed.stock_of("1"), Some(BigDecimal::zero()));
        assert!(feed.diagnostics.is_empty());
    }
}
