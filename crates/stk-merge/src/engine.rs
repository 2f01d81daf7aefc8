use bigdecimal::{BigDecimal, Zero};
use stk_feed::{
    load, render_quantity, Document, FeedError, KeyField, LoadedFeed, NodeId, ProductRecord,
    STOCK_TAG,
};
use tracing::{debug, info, info_span, warn};

use crate::{FeedSide, MergeDiagnostic, MergedFeed, SummaryRow};

/// Overwrite (or create) the `<stok>` child of a product node.
fn write_stock(doc: &mut Document, product: NodeId, total: &BigDecimal) {
    let stock = match doc.find_child(product, STOCK_TAG) {
        Some(id) => id,
        None => doc.append_element(product, STOCK_TAG),
    };
    doc.set_text(stock, render_quantity(total));
}

fn summary_row(
    record: &ProductRecord,
    supplier_stock: BigDecimal,
    total_stock: BigDecimal,
) -> SummaryRow {
    SummaryRow {
        key: record.key.clone(),
        barcode: record.barcode.clone().unwrap_or_default(),
        product_name: record.name.clone().unwrap_or_default(),
        store_stock: record.stock.clone(),
        supplier_stock,
        total_stock,
    }
}

/// Merge supplier stock into the store feed.
///
/// - Every indexed store product yields exactly one row, in store order
/// - Supplier-only keys are ignored
/// - `total = store + supplier` (missing supplier entry => 0); a negative
///   total is written as 0 and reported
/// - Store products that were never indexed (no key) are left untouched
///
/// Consumes the store feed: its document is the one being mutated.
pub fn merge(store: LoadedFeed, supplier: &LoadedFeed) -> MergedFeed {
    let LoadedFeed {
        mut document,
        products,
        diagnostics: store_diags,
    } = store;

    let mut diagnostics: Vec<MergeDiagnostic> = store_diags
        .into_iter()
        .map(|d| MergeDiagnostic::from_feed(FeedSide::Store, d))
        .chain(
            supplier
                .diagnostics
                .iter()
                .cloned()
                .map(|d| MergeDiagnostic::from_feed(FeedSide::Supplier, d)),
        )
        .collect();

    let mut rows = Vec::with_capacity(products.len());
    let mut matched = 0usize;

    for record in &products {
        let supplier_stock = match supplier.products.get(&record.key) {
            Some(s) => {
                matched += 1;
                s.stock.clone()
            }
            None => BigDecimal::zero(),
        };

        let mut total = &record.stock + &supplier_stock;
        if total < BigDecimal::zero() {
            warn!(
                key = %record.key,
                total = %render_quantity(&total),
                "negative total stock, clamping to 0"
            );
            diagnostics.push(MergeDiagnostic::NegativeTotalClamped {
                key: record.key.clone(),
                total,
            });
            total = BigDecimal::zero();
        }

        write_stock(&mut document, record.node, &total);
        rows.push(summary_row(record, supplier_stock, total));
    }

    MergedFeed {
        document,
        rows,
        diagnostics,
        matched,
    }
}

/// Load both feeds and merge them.
///
/// `key_field` is checked before either document is parsed. Any load error
/// aborts the whole merge; nothing partial is returned.
pub fn merge_feeds(
    store_xml: &[u8],
    supplier_xml: &[u8],
    key_field: &str,
) -> Result<MergedFeed, FeedError> {
    let key_field = KeyField::parse(key_field)?;

    let store = info_span!("load", feed = %FeedSide::Store)
        .in_scope(|| load(store_xml, key_field))?;
    let supplier = info_span!("load", feed = %FeedSide::Supplier)
        .in_scope(|| load(supplier_xml, key_field))?;

    info!(
        key_field = %key_field,
        store_products = store.products.len(),
        supplier_products = supplier.products.len(),
        "feeds loaded"
    );

    let merged = merge(store, &supplier);

    debug!(
        rows = merged.rows.len(),
        matched = merged.matched,
        diagnostics = merged.diagnostics.len(),
        "merge complete"
    );
    Ok(merged)
}
