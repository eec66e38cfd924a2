//! Decimal arithmetic helpers shared by every calculator.
//!
//! Money and volumes are both `rust_decimal::Decimal`; the aliases below only document
//! intent at call sites. Nothing here rounds: rounding is a presentation concern.

use rust_decimal::Decimal;

/// Volume in liters (meters report 3 decimal places).
pub type Liters = Decimal;

/// Currency amount (2 decimal places in practice).
pub type Money = Decimal;

pub const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// `numerator / denominator`, or `fallback` when the division is degenerate (zero
/// denominator or overflow).
pub fn ratio_or(numerator: Decimal, denominator: Decimal, fallback: Decimal) -> Decimal {
    if denominator.is_zero() {
        return fallback;
    }
    numerator.checked_div(denominator).unwrap_or(fallback)
}

/// `part / total * 100`, defined as 0 when `total` is 0.
pub fn percent_of(part: Decimal, total: Decimal) -> Decimal {
    ratio_or(part * HUNDRED, total, Decimal::ZERO)
}

/// Caps a percentage at 100.
pub fn cap_percent(value: Decimal) -> Decimal {
    value.min(HUNDRED)
}

/// Sum an iterator of decimals.
pub fn sum<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().fold(Decimal::ZERO, |acc, v| acc + v)
}
