//! Money calculation helpers
//!
//! Prices travel as JSON numbers and are held as `Decimal` on the client.
//! Every derived amount is rounded to the currency minor unit.

use rust_decimal::prelude::*;

/// Rounding precision for monetary values (2 decimal places, half away from zero)
pub const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Round a monetary value to the minor unit
#[inline]
pub fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Price multiplied by quantity, rounded
#[inline]
pub fn line_total(price: Decimal, quantity: u32) -> Decimal {
    round(price * Decimal::from(quantity))
}

/// Whether two amounts agree within [`MONEY_TOLERANCE`]
pub fn approx_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < MONEY_TOLERANCE
}
