//! Accumulation phase: savings growth up to retirement

use rust_decimal::Decimal;

use crate::error::{PlannerError, PlannerResult};
use crate::money::{compound_factor, is_compoundable, percent_to_fraction, Money, Rate};

/// Balance at retirement age
///
/// Future value of the current savings plus an ordinary annuity of
/// `annual_contribution`, deposited at each year end:
///
/// `S * (1+r)^n + C * ((1+r)^n - 1) / r`, or `S + C * n` when `r == 0`.
///
/// Returns `current_savings` unchanged when there are no growth years.
/// The result is not rounded; round with `round_currency` for display.
pub fn project_balance(
    current_age: u32,
    retirement_age: u32,
    current_savings: Money,
    annual_contribution: Money,
    return_rate: Rate,
) -> PlannerResult<Money> {
    if retirement_age <= current_age {
        return Ok(current_savings);
    }

    if !is_compoundable(return_rate) {
        return Err(PlannerError::invalid(
            "expected_return_rate",
            "Rate must be greater than -100%",
        ));
    }

    let years = retirement_age - current_age;
    let r = percent_to_fraction(return_rate);

    let overflow = || PlannerError::Overflow {
        context: format!("projecting {} years at {}%", years, return_rate),
    };

    if r.is_zero() {
        return annual_contribution
            .checked_mul(Decimal::from(years))
            .and_then(|contributions| current_savings.checked_add(contributions))
            .ok_or_else(overflow);
    }

    let growth = compound_factor(r, years)?;
    let grown_savings = current_savings.checked_mul(growth).ok_or_else(overflow)?;
    let annuity_factor = (growth - Decimal::ONE)
        .checked_div(r)
        .ok_or_else(overflow)?;
    let grown_contributions = annual_contribution
        .checked_mul(annuity_factor)
        .ok_or_else(overflow)?;

    grown_savings
        .checked_add(grown_contributions)
        .ok_or_else(overflow)
}
