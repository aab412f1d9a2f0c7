//! Decimal money and rate helpers
//!
//! All balances, contributions and withdrawals are `Decimal` so that
//! multi-year loops do not accumulate binary floating point drift.
//! Rates are carried as percentages (7.0 = 7%) and converted at the
//! point of use.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::{PlannerError, PlannerResult};

/// Monetary amount
pub type Money = Decimal;

/// Percentage rate (7.0 means 7%)
pub type Rate = Decimal;

/// Decimal places used when presenting currency
pub const CURRENCY_DP: u32 = 2;

const HUNDRED: Decimal = dec!(100);

/// Convert a percentage to a fraction (7.0 -> 0.07)
pub fn percent_to_fraction(rate: Rate) -> Decimal {
    rate / HUNDRED
}

/// Whether a percentage rate can be used for compounding (strictly above -100%)
pub fn is_compoundable(rate: Rate) -> bool {
    rate > -HUNDRED
}

/// (1 + r)^n by repeated multiplication, r given as a fraction
///
/// Whole years only, so the factor stays exact in decimal.
pub fn compound_factor(fraction: Decimal, years: u32) -> PlannerResult<Decimal> {
    let base = Decimal::ONE + fraction;
    let mut factor = Decimal::ONE;
    for _ in 0..years {
        factor = factor.checked_mul(base).ok_or_else(|| PlannerError::Overflow {
            context: format!("compounding {} over {} years", base, years),
        })?;
    }
    Ok(factor)
}

/// Round to currency precision for presentation
pub fn round_currency(value: Money) -> Money {
    value.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero)
}
