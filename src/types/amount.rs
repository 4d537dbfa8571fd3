//! Amount parsing and validation
//!
//! Amounts are held as `Decimal`, which cannot represent NaN or infinity. The
//! non-finite checks therefore live here, at the boundary where amounts arrive
//! as text or floating point.

use super::error::RejectionReason;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a textual amount
///
/// Accepts plain decimal notation (`"100"`, `"0.25"`) and scientific notation
/// (`"1e3"`). Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns `RejectionReason::InvalidAmount` for empty input, non-numeric text,
/// `NaN`/`inf` spellings and negative values.
pub fn parse_amount(raw: &str) -> Result<Decimal, RejectionReason> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RejectionReason::invalid_amount(raw));
    }

    let parsed = match Decimal::from_str(trimmed) {
        Err(_) if trimmed.contains(['e', 'E']) => Decimal::from_scientific(trimmed),
        other => other,
    };

    match parsed {
        Ok(amount) => validate_amount(amount),
        Err(_) => Err(RejectionReason::invalid_amount(raw)),
    }
}

/// Convert a floating point amount
///
/// # Errors
///
/// Returns `RejectionReason::InvalidAmount` for NaN, infinities, negative
/// values and values outside the decimal range.
pub fn amount_from_f64(value: f64) -> Result<Decimal, RejectionReason> {
    if !value.is_finite() {
        return Err(RejectionReason::invalid_amount(value.to_string()));
    }
    let amount = Decimal::try_from(value)
        .map_err(|_| RejectionReason::invalid_amount(value.to_string()))?;
    validate_amount(amount)
}

/// Reject negative amounts; zero is allowed
pub fn validate_amount(amount: Decimal) -> Result<Decimal, RejectionReason> {
    if amount < Decimal::ZERO {
        return Err(RejectionReason::invalid_amount(amount.to_string()));
    }
    Ok(amount)
}
