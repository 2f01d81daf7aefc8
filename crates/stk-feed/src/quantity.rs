//! Stock quantity parsing and the canonical decimal rendering.
//!
//! Quantities are arbitrary-precision [`BigDecimal`]s end to end; no floats
//! and no fixed width, so `12,5 + 0,5` is exactly `13` and a 30-digit stock
//! sums without loss.

use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use thiserror::Error;

/// Largest accepted decimal exponent magnitude. Anything beyond would render
/// as thousands of digits in fixed point.
pub const MAX_EXPONENT: i64 = 4096;

/// A stock value that is neither blank nor a usable number.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("non-numeric stock value {raw:?}")]
pub struct MalformedQuantity {
    /// The offending text, trimmed.
    pub raw: String,
}

/// Parse a stock quantity.
///
/// Surrounding whitespace is ignored, blank text is zero and `,` is read as
/// the decimal separator. Plain and scientific (`1e3`) notation are both
/// accepted, at any precision; exponents beyond [`MAX_EXPONENT`] are not.
pub fn parse_quantity(text: &str) -> Result<BigDecimal, MalformedQuantity> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(BigDecimal::zero());
    }
    let malformed = || MalformedQuantity {
        raw: trimmed.to_string(),
    };
    let value = BigDecimal::from_str(&trimmed.replace(',', ".")).map_err(|_| malformed())?;
    let (_, scale) = value.as_bigint_and_exponent();
    if scale.unsigned_abs() > MAX_EXPONENT.unsigned_abs() {
        return Err(malformed());
    }
    Ok(value)
}

/// Tolerant form of [`parse_quantity`]: an absent or malformed value is zero.
///
/// The rejected text is handed back so the caller can report it; this never
/// fails.
pub fn quantity_or_zero(text: Option<&str>) -> (BigDecimal, Option<MalformedQuantity>) {
    match text.map(parse_quantity) {
        None => (BigDecimal::zero(), None),
        Some(Ok(v)) => (v, None),
        Some(Err(e)) => (BigDecimal::zero(), Some(e)),
    }
}

/// Render a quantity for output.
///
/// Integral values (whatever their scale) render as a plain integer; anything
/// else renders in fixed point with the value's own scale, never in exponent
/// notation.
pub fn render_quantity(value: &BigDecimal) -> String {
    if value.is_zero() {
        return "0".to_string();
    }
    let whole = value.with_scale(0);
    if &whole == value {
        whole.to_plain_string()
    } else {
        value.to_plain_string()
    }
}
