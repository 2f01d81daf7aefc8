use std::fmt;
use std::str::FromStr;

use crate::product::{BARCODE_TAG, STOCK_CODE_TAG};
use crate::FeedError;

/// The product field used to join store and supplier records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum KeyField {
    /// `<barkod>`
    #[default]
    Barcode,
    /// `<stokKodu>`
    StockCode,
}

impl KeyField {
    /// Parse a caller-supplied selector.
    ///
    /// Accepts the element tag (`barkod`, `stokKodu`) or the English alias
    /// (`barcode`, `stock-code`). Surrounding whitespace is ignored; case is not.
    pub fn parse(s: &str) -> Result<KeyField, FeedError> {
        match s.trim() {
            "barkod" | "barcode" => Ok(KeyField::Barcode),
            "stokKodu" | "stock-code" => Ok(KeyField::StockCode),
            other => Err(FeedError::InvalidArgument(other.to_string())),
        }
    }

    /// Element tag holding the key inside a `<urun>`.
    pub fn tag(&self) -> &'static str {
        match self {
            KeyField::Barcode => BARCODE_TAG,
            KeyField::StockCode => STOCK_CODE_TAG,
        }
    }
}

impl FromStr for KeyField {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyField::parse(s)
    }
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
