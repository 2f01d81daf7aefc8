//! stk-merge
//!
//! Store/supplier stock merge.
//!
//! - The store feed is authoritative: it defines the product universe and the
//!   output structure
//! - The supplier feed only contributes stock for keys the store already has
//! - Totals are exact decimal sums, clamped at zero
//! - The store document is mutated in place (`<stok>` inserted or
//!   overwritten) and one [`SummaryRow`] is produced per store product
//!
//! Deterministic, pure logic. No IO. Diagnostics go to `tracing` and are also
//! returned on [`MergedFeed`].

mod engine;
mod table;
mod types;

pub use engine::{merge, merge_feeds};
pub use table::{render_table, TableError, TableOptions, TABLE_HEADER};
pub use types::*;
