//! Withdrawal strategies for the decumulation phase
//!
//! A strategy turns (balance, year of retirement, inflation) into the gross
//! withdrawal for that year. The four policies share two post-processing
//! rules, kept in one place here:
//!
//! 1. Inflation: when `adjust_for_inflation` is set, the amount is scaled by
//!    `(1 + inflation)^(year_index - 1)`. Year 1 is the baseline.
//! 2. Floor: with a `minimum_balance`, the withdrawal never takes the balance
//!    below the floor, and is zero once the balance is at or under it.
//!
//! RMD skips both: the divisor table already shapes the curve and a mandatory
//! distribution cannot be suppressed by a floor.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assumptions::RmdTable;
use crate::error::{PlannerError, PlannerResult};
use crate::money::{compound_factor, percent_to_fraction, Money, Rate};
use crate::plan::RetirementScenario;

/// Closed set of withdrawal policies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StrategyType {
    /// Level amount, optionally inflation-indexed
    FixedAmount,

    /// Percentage of the current balance, recomputed each year
    PercentageBased,

    /// Lesser of a percentage ceiling and a blend of the fixed amount with it
    Dynamic {
        /// Weight on the (inflated) fixed amount, 0..=1. At 1 the result is
        /// min(ceiling, fixed).
        blend_weight: Decimal,
    },

    /// Balance divided by the distribution period for the attained age
    RequiredMinimumDistribution {
        /// Age in the first year of retirement
        retirement_age: u32,
    },
}

impl StrategyType {
    /// Dynamic policy with the default weight of 1
    pub fn dynamic() -> Self {
        StrategyType::Dynamic {
            blend_weight: Decimal::ONE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::FixedAmount => "FixedAmount",
            StrategyType::PercentageBased => "PercentageBased",
            StrategyType::Dynamic { .. } => "Dynamic",
            StrategyType::RequiredMinimumDistribution { .. } => "RequiredMinimumDistribution",
        }
    }
}

/// A decumulation policy attached to a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalStrategy {
    pub strategy_id: Uuid,

    /// Back-reference to the owning scenario
    pub scenario_id: Uuid,

    pub name: String,

    pub strategy_type: StrategyType,

    /// Percent of balance, used by PercentageBased and Dynamic
    pub withdrawal_rate: Rate,

    /// Base annual amount, used by FixedAmount and Dynamic
    pub annual_withdrawal_amount: Money,

    pub adjust_for_inflation: bool,

    /// Principal protected from withdrawal
    pub minimum_balance: Option<Money>,

    pub notes: Option<String>,
}

impl Default for WithdrawalStrategy {
    fn default() -> Self {
        Self {
            strategy_id: Uuid::new_v4(),
            scenario_id: Uuid::nil(),
            name: String::new(),
            strategy_type: StrategyType::FixedAmount,
            withdrawal_rate: Decimal::ZERO,
            annual_withdrawal_amount: Decimal::ZERO,
            adjust_for_inflation: false,
            minimum_balance: None,
            notes: None,
        }
    }
}

impl WithdrawalStrategy {
    pub fn fixed_amount(annual_withdrawal_amount: Money) -> Self {
        Self {
            name: "Fixed amount".to_string(),
            strategy_type: StrategyType::FixedAmount,
            annual_withdrawal_amount,
            ..Self::default()
        }
    }

    pub fn percentage_based(withdrawal_rate: Rate) -> Self {
        Self {
            name: format!("{}% of balance", withdrawal_rate.normalize()),
            strategy_type: StrategyType::PercentageBased,
            withdrawal_rate,
            ..Self::default()
        }
    }

    pub fn dynamic(
        withdrawal_rate: Rate,
        annual_withdrawal_amount: Money,
        blend_weight: Decimal,
    ) -> Self {
        Self {
            name: "Dynamic".to_string(),
            strategy_type: StrategyType::Dynamic { blend_weight },
            withdrawal_rate,
            annual_withdrawal_amount,
            ..Self::default()
        }
    }

    pub fn required_minimum_distribution(retirement_age: u32) -> Self {
        Self {
            name: "Required minimum distribution".to_string(),
            strategy_type: StrategyType::RequiredMinimumDistribution { retirement_age },
            ..Self::default()
        }
    }

    /// Copy bound to a scenario: takes its id and, for RMD, its retirement age
    pub fn for_scenario(&self, scenario: &RetirementScenario) -> Self {
        let mut bound = self.with_retirement_age(scenario.retirement_age);
        bound.scenario_id = scenario.scenario_id;
        bound
    }

    /// Copy with the RMD retirement age replaced; other policies are unchanged
    pub fn with_retirement_age(&self, age: u32) -> Self {
        let mut bound = self.clone();
        if let StrategyType::RequiredMinimumDistribution { retirement_age } =
            &mut bound.strategy_type
        {
            *retirement_age = age;
        }
        bound
    }

    /// Check the strategy configuration
    ///
    /// Not enforced on construction so invalid strategies can be built and
    /// checked explicitly.
    pub fn validate(&self) -> PlannerResult<()> {
        if self.withdrawal_rate < Decimal::ZERO || self.withdrawal_rate > dec!(100) {
            return Err(PlannerError::invalid(
                "withdrawal_rate",
                "Withdrawal rate must be between 0 and 100",
            ));
        }

        if self.annual_withdrawal_amount < Decimal::ZERO {
            return Err(PlannerError::invalid(
                "annual_withdrawal_amount",
                "Annual withdrawal amount cannot be negative",
            ));
        }

        if let Some(floor) = self.minimum_balance {
            if floor < Decimal::ZERO {
                return Err(PlannerError::invalid(
                    "minimum_balance",
                    "Minimum balance cannot be negative",
                ));
            }
        }

        if let StrategyType::Dynamic { blend_weight } = self.strategy_type {
            if blend_weight < Decimal::ZERO || blend_weight > Decimal::ONE {
                return Err(PlannerError::invalid(
                    "blend_weight",
                    "Blend weight must be between 0 and 1",
                ));
            }
        }

        Ok(())
    }

    /// Gross withdrawal for a year using the built-in RMD table
    ///
    /// `year_index` is 1 for the first year of retirement.
    pub fn calculate_withdrawal(
        &self,
        current_balance: Money,
        year_index: u32,
        inflation_rate: Rate,
    ) -> PlannerResult<Money> {
        self.calculate_withdrawal_with_table(
            current_balance,
            year_index,
            inflation_rate,
            RmdTable::shared(),
        )
    }

    /// Gross withdrawal for a year with an explicit RMD table
    pub fn calculate_withdrawal_with_table(
        &self,
        current_balance: Money,
        year_index: u32,
        inflation_rate: Rate,
        rmd_table: &RmdTable,
    ) -> PlannerResult<Money> {
        if current_balance < Decimal::ZERO {
            return Err(PlannerError::NegativeBalance {
                balance: current_balance,
            });
        }

        let withdrawal = match self.strategy_type {
            StrategyType::FixedAmount => {
                self.inflate(self.annual_withdrawal_amount, year_index, inflation_rate)?
            }
            StrategyType::PercentageBased => {
                let raw = self.percentage_of(current_balance);
                self.inflate(raw, year_index, inflation_rate)?
            }
            StrategyType::Dynamic { blend_weight } => {
                let ceiling = self.percentage_of(current_balance);
                let fixed =
                    self.inflate(self.annual_withdrawal_amount, year_index, inflation_rate)?;
                let blended = blend_weight * fixed + (Decimal::ONE - blend_weight) * ceiling;
                ceiling.min(blended)
            }
            StrategyType::RequiredMinimumDistribution { retirement_age } => {
                let age = retirement_age + year_index.saturating_sub(1);
                // Divisors are >= 1, so this never exceeds the balance
                return Ok(current_balance / rmd_table.divisor(age));
            }
        };

        Ok(self.apply_floor(current_balance, withdrawal.max(Decimal::ZERO)))
    }

    fn percentage_of(&self, balance: Money) -> Money {
        balance * percent_to_fraction(self.withdrawal_rate)
    }

    fn inflate(&self, amount: Money, year_index: u32, inflation_rate: Rate) -> PlannerResult<Money> {
        if !self.adjust_for_inflation || year_index <= 1 {
            return Ok(amount);
        }

        let factor = compound_factor(percent_to_fraction(inflation_rate), year_index - 1)?;
        amount.checked_mul(factor).ok_or_else(|| PlannerError::Overflow {
            context: format!("inflating withdrawal for year {}", year_index),
        })
    }

    fn apply_floor(&self, balance: Money, withdrawal: Money) -> Money {
        match self.minimum_balance {
            Some(floor) if balance <= floor => Decimal::ZERO,
            Some(floor) => withdrawal.min(balance - floor),
            None => withdrawal,
        }
    }
}
