//! Money helpers built on `rust_decimal`
//!
//! All arithmetic stays in [`Decimal`]; rounding to cents happens only when a
//! figure leaves the engine (ledger rows, reports, rendering).

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
pub const DECIMAL_PLACES: u32 = 2;

/// Default currency symbol used when rendering amounts
pub const DEFAULT_CURRENCY_SYMBOL: &str = "€";

/// Round a monetary value to cents
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a free-text amount the way a numeric input field reads it.
///
/// Blank or unparsable text counts as zero; a comma is accepted as the
/// decimal separator.
pub fn parse_amount_or_zero(input: &str) -> Decimal {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&trimmed.replace(',', ".")).unwrap_or(Decimal::ZERO)
}

/// Render an amount with two decimals and a currency symbol, e.g. `€12.50`
/// or `-€5.00`.
pub fn format_money(value: Decimal, symbol: &str) -> String {
    let rounded = round_money(value);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}{:.2}", symbol, rounded.abs())
    } else {
        format!("{}{:.2}", symbol, rounded.abs())
    }
}
