//! Flat CSV rendering of summary rows for spreadsheet tools.

use thiserror::Error;

use crate::SummaryRow;

/// Column titles, in output order.
pub const TABLE_HEADER: [&str; 6] = [
    "Barkod",
    "Key",
    "Ürün Adı",
    "Mağaza Stok",
    "Tedarikçi Stok",
    "Toplam Stok",
];

/// Spreadsheet tools only detect UTF-8 when the file starts with a BOM.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableOptions {
    /// Field delimiter. `,` by default; `;` suits locales where `,` is the
    /// decimal separator.
    pub delimiter: u8,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv flush failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Render rows as BOM-prefixed UTF-8 CSV.
///
/// Minimal quoting (only fields containing the delimiter, a quote or a line
/// break) and CRLF record terminators.
pub fn render_table(rows: &[SummaryRow], opts: &TableOptions) -> Result<Vec<u8>, TableError> {
    let mut out = UTF8_BOM.to_vec();
    {
        let mut w = csv::WriterBuilder::new()
            .delimiter(opts.delimiter)
            .terminator(csv::Terminator::CRLF)
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(&mut out);

        w.write_record(TABLE_HEADER)?;
        for r in rows {
            let store = r.store_stock_display();
            let supplier = r.supplier_stock_display();
            let total = r.total_stock_display();
            w.write_record([
                r.barcode.as_str(),
                r.key.as_str(),
                r.product_name.as_str(),
                store.as_str(),
                supplier.as_str(),
                total.as_str(),
            ])?;
        }
        w.flush()?;
    }
    Ok(out)
}
