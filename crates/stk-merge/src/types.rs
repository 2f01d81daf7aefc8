use std::fmt;

use bigdecimal::BigDecimal;
use serde::{Serialize, Serializer};
use stk_feed::{render_quantity, render_xml, Document, FeedDiagnostic, FeedError};

use crate::{render_table, TableError, TableOptions};

/// Which input a diagnostic came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeedSide {
    Store,
    Supplier,
}

impl FeedSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSide::Store => "store",
            FeedSide::Supplier => "supplier",
        }
    }
}

impl fmt::Display for FeedSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal observations. None of these alter control flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeDiagnostic {
    /// A `<stok>` value could not be parsed and was read as 0.
    MalformedQuantity {
        feed: FeedSide,
        key: String,
        raw: String,
    },
    /// `store + supplier` was negative; the written total is 0.
    NegativeTotalClamped { key: String, total: BigDecimal },
}

impl MergeDiagnostic {
    pub(crate) fn from_feed(feed: FeedSide, d: FeedDiagnostic) -> Self {
        match d {
            FeedDiagnostic::MalformedQuantity { key, raw } => {
                MergeDiagnostic::MalformedQuantity { feed, key, raw }
            }
        }
    }

    pub fn key(&self) -> &str {
        match self {
            MergeDiagnostic::MalformedQuantity { key, .. }
            | MergeDiagnostic::NegativeTotalClamped { key, .. } => key,
        }
    }
}

/// One merged product, flattened for tables and UIs.
///
/// Serializes under the feed's own field names (`barkod`, `urunAdi`,
/// `stok_magaza`, `stok_tedarikci`, `stok_toplam`) with every stock rendered
/// through [`render_quantity`] as a string, so `5.00` becomes `"5"`, `12.50`
/// stays `"12.50"` and no precision is lost to JSON numbers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub key: String,
    /// `<barkod>` text, empty when absent.
    #[serde(rename = "barkod")]
    pub barcode: String,
    /// `<urunAdi>` text, empty when absent.
    #[serde(rename = "urunAdi")]
    pub product_name: String,
    #[serde(rename = "stok_magaza", serialize_with = "rendered")]
    pub store_stock: BigDecimal,
    #[serde(rename = "stok_tedarikci", serialize_with = "rendered")]
    pub supplier_stock: BigDecimal,
    #[serde(rename = "stok_toplam", serialize_with = "rendered")]
    pub total_stock: BigDecimal,
}

impl SummaryRow {
    pub fn store_stock_display(&self) -> String {
        render_quantity(&self.store_stock)
    }

    pub fn supplier_stock_display(&self) -> String {
        render_quantity(&self.supplier_stock)
    }

    pub fn total_stock_display(&self) -> String {
        render_quantity(&self.total_stock)
    }
}

fn rendered<S: Serializer>(v: &BigDecimal, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&render_quantity(v))
}

/// Result of a merge: the mutated store document plus its summary.
#[derive(Clone, Debug)]
pub struct MergedFeed {
    /// The store document with every indexed product's `<stok>` set to its
    /// total. Everything else is exactly as parsed.
    pub document: Document,
    /// One row per indexed store product, in store document order.
    pub rows: Vec<SummaryRow>,
    pub diagnostics: Vec<MergeDiagnostic>,
    /// Store products that found a supplier entry with the same key.
    pub matched: usize,
}

impl MergedFeed {
    pub fn to_xml(&self) -> Result<Vec<u8>, FeedError> {
        render_xml(&self.document)
    }

    pub fn to_table(&self, opts: &TableOptions) -> Result<Vec<u8>, TableError> {
        render_table(&self.rows, opts)
    }

    pub fn clamped_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.diagnostics.iter().filter_map(|d| match d {
            MergeDiagnostic::NegativeTotalClamped { key, .. } => Some(key.as_str()),
            _ => None,
        })
    }
}
