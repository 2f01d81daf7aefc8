//! stk-feed
//!
//! Product feed loading for the stock merge.
//!
//! - Parses raw XML bytes into an arena [`Document`] (stable [`NodeId`]s, no
//!   aliased references into the tree)
//! - Validates the `<urunler>` root and indexes direct `<urun>` children by the
//!   chosen [`KeyField`]
//! - Tolerant stock parsing: malformed quantities become zero plus a
//!   diagnostic, never an error
//! - Renders a (possibly mutated) document back to UTF-8 XML
//!
//! Deterministic, pure logic. No IO.

mod document;
mod error;
mod key;
mod loader;
mod product;
mod quantity;
mod render;

pub use document::{Document, Element, Node, NodeId};
pub use error::FeedError;
pub use key::KeyField;
pub use loader::{load, load_with_key, FeedDiagnostic, LoadedFeed};
pub use product::{
    ProductIndex, ProductRecord, BARCODE_TAG, NAME_TAG, PRODUCT_TAG, ROOT_TAG, STOCK_CODE_TAG,
    STOCK_TAG,
};
pub use quantity::{
    parse_quantity, quantity_or_zero, render_quantity, MalformedQuantity, MAX_EXPONENT,
};
pub use render::render_xml;

pub use bigdecimal::BigDecimal;
