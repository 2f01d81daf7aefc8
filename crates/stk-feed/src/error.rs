use thiserror::Error;

/// Failures that abort loading (and therefore the whole merge).
///
/// Malformed stock quantities are deliberately absent: they are recovered
/// locally (see [`crate::quantity_or_zero`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// Bytes are not well-formed UTF-8 XML.
    #[error("invalid XML format: {0}")]
    InvalidFormat(String),

    /// Well-formed XML whose root element is not the expected tag.
    #[error("root element must be <{expected}>, found <{found}>")]
    StructuralMismatch {
        expected: &'static str,
        found: String,
    },

    /// Key-field selector outside the accepted set. Raised before parsing.
    #[error("key field must be 'barkod' or 'stokKodu', got {0:?}")]
    InvalidArgument(String),

    /// The document could not be written back out.
    #[error("xml render failed: {0}")]
    Render(String),
}
