use std::collections::HashMap;

use bigdecimal::BigDecimal;

use crate::NodeId;

/// Required root element of every feed.
pub const ROOT_TAG: &str = "urunler";
/// Product element; only direct children of the root are scanned.
pub const PRODUCT_TAG: &str = "urun";
pub const STOCK_TAG: &str = "stok";
pub const BARCODE_TAG: &str = "barkod";
pub const STOCK_CODE_TAG: &str = "stokKodu";
pub const NAME_TAG: &str = "urunAdi";

/// Typed view of one indexed `<urun>`, built once at load time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductRecord {
    /// Trimmed, non-empty text of the key field.
    pub key: String,
    /// Parsed `<stok>`; zero when absent or malformed.
    pub stock: BigDecimal,
    /// The `<urun>` element in the owning document.
    pub node: NodeId,
    /// Trimmed `<barkod>` text, `None` when absent or blank.
    pub barcode: Option<String>,
    /// Trimmed `<urunAdi>` text, `None` when absent or blank.
    pub name: Option<String>,
}

/// Key -> record map that iterates in document order.
///
/// A repeated key keeps the position of its first occurrence but takes the
/// value of its last one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductIndex {
    records: Vec<ProductRecord>,
    positions: HashMap<String, usize>,
}

impl ProductIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the one it replaced.
    pub fn insert(&mut self, record: ProductRecord) -> Option<ProductRecord> {
        match self.positions.get(&record.key) {
            Some(&i) => Some(std::mem::replace(&mut self.records[i], record)),
            None => {
                self.positions.insert(record.key.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ProductRecord> {
        self.positions.get(key).map(|&i| &self.records[i])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProductRecord> {
        self.records.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.iter().map(|r| r.key.as_str())
    }
}

impl<'a> IntoIterator for &'a ProductIndex {
    type Item = &'a ProductRecord;
    type IntoIter = std::slice::Iter<'a, ProductRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
