//! Decumulation engine: year-by-year withdrawal and growth loop

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ledger::{LedgerRow, SimulationResult};
use super::state::{DecumulationState, SimulationState};
use crate::assumptions::{Assumptions, RmdTable};
use crate::error::{PlannerError, PlannerResult};
use crate::money::{is_compoundable, percent_to_fraction, Money, Rate};
use crate::plan::{RetirementScenario, WithdrawalStrategy};

/// Configuration for a decumulation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecumulationConfig {
    /// Age in the first year of retirement
    pub retirement_age: u32,

    /// Number of years to simulate
    pub years: u32,

    /// Nominal return applied after each withdrawal, percent
    pub return_rate: Rate,

    /// Inflation passed to the strategy, percent
    pub inflation_rate: Rate,
}

impl DecumulationConfig {
    /// Horizon from retirement to life expectancy
    pub fn from_scenario(scenario: &RetirementScenario) -> Self {
        Self {
            retirement_age: scenario.retirement_age,
            years: scenario.years_in_retirement(),
            return_rate: scenario.expected_return_rate,
            inflation_rate: scenario.inflation_rate,
        }
    }
}

/// Main decumulation engine
#[derive(Debug, Clone, Default)]
pub struct DecumulationSimulator {
    assumptions: Assumptions,
}

impl DecumulationSimulator {
    /// Create a new simulator with given assumptions
    pub fn new(assumptions: Assumptions) -> Self {
        Self { assumptions }
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    /// Build the ledger for a run without evaluating any year
    ///
    /// Refuses to start on an invalid strategy, a negative starting balance
    /// or a rate at or below -100%.
    pub fn ledger(
        &self,
        starting_balance: Money,
        strategy: &WithdrawalStrategy,
        config: DecumulationConfig,
    ) -> PlannerResult<Ledger<'_>> {
        strategy.validate()?;

        if starting_balance < Decimal::ZERO {
            return Err(PlannerError::NegativeBalance {
                balance: starting_balance,
            });
        }
        if !is_compoundable(config.return_rate) {
            return Err(PlannerError::invalid(
                "return_rate",
                "Rate must be greater than -100%",
            ));
        }
        if !is_compoundable(config.inflation_rate) {
            return Err(PlannerError::invalid(
                "inflation_rate",
                "Rate must be greater than -100%",
            ));
        }

        Ok(Ledger {
            strategy: strategy.with_retirement_age(config.retirement_age),
            rmd: &self.assumptions.rmd,
            config,
            starting_balance,
        })
    }

    /// Run a full simulation
    pub fn simulate(
        &self,
        starting_balance: Money,
        strategy: &WithdrawalStrategy,
        config: DecumulationConfig,
    ) -> PlannerResult<SimulationResult> {
        self.ledger(starting_balance, strategy, config)?.run()
    }
}

/// Validated inputs for one run
///
/// The run is a pure function of these inputs, so `iter` can be called any
/// number of times and each call replays the same years from the start.
#[derive(Debug, Clone)]
pub struct Ledger<'a> {
    strategy: WithdrawalStrategy,
    rmd: &'a RmdTable,
    config: DecumulationConfig,
    starting_balance: Money,
}

impl<'a> Ledger<'a> {
    pub fn config(&self) -> &DecumulationConfig {
        &self.config
    }

    pub fn strategy(&self) -> &WithdrawalStrategy {
        &self.strategy
    }

    pub fn starting_balance(&self) -> Money {
        self.starting_balance
    }

    /// Lazy iterator over the ledger rows, starting from year 1
    pub fn iter(&self) -> LedgerIter<'_, 'a> {
        LedgerIter {
            ledger: self,
            state: DecumulationState::at_retirement(
                self.starting_balance,
                self.config.retirement_age,
                self.config.years,
            ),
            failed: false,
        }
    }

    /// Evaluate every year and collect the result
    pub fn run(&self) -> PlannerResult<SimulationResult> {
        log::debug!(
            "Simulating '{}' ({}) from {} over {} years at {}% return, {}% inflation",
            self.strategy.name,
            self.strategy.strategy_type.as_str(),
            self.starting_balance,
            self.config.years,
            self.config.return_rate,
            self.config.inflation_rate,
        );

        let mut result = SimulationResult::new(self.strategy.strategy_id, self.starting_balance);
        let mut iter = self.iter();
        for row in iter.by_ref() {
            result.add_row(row?);
        }
        result.state = iter.state.status;

        if let SimulationState::Depleted { year_index, age } = result.state {
            log::info!(
                "Strategy '{}' depleted the balance in year {} (age {})",
                self.strategy.name,
                year_index,
                age
            );
        }

        Ok(result)
    }

    /// One year: withdraw at the start, then grow what remains
    fn advance(&self, state: &mut DecumulationState) -> PlannerResult<LedgerRow> {
        state.advance_year();

        let starting_balance = state.balance;
        let requested = self.strategy.calculate_withdrawal_with_table(
            starting_balance,
            state.year_index,
            self.config.inflation_rate,
            self.rmd,
        )?;

        let remaining = starting_balance - requested;
        if remaining < Decimal::ZERO {
            // Pay out what is left; nothing remains to grow
            state.balance = Decimal::ZERO;
            state.status = SimulationState::Depleted {
                year_index: state.year_index,
                age: state.age,
            };
            return Ok(LedgerRow {
                year_index: state.year_index,
                age: state.age,
                starting_balance,
                requested_withdrawal: requested,
                withdrawal: starting_balance,
                growth: Decimal::ZERO,
                balance_after_growth: Decimal::ZERO,
            });
        }

        let growth_factor = Decimal::ONE + percent_to_fraction(self.config.return_rate);
        let grown = remaining
            .checked_mul(growth_factor)
            .ok_or_else(|| PlannerError::Overflow {
                context: format!("growing balance in year {}", state.year_index),
            })?;

        state.balance = grown;
        if state.year_index >= self.config.years {
            state.status = SimulationState::HorizonReached;
        }

        log::trace!(
            "Year {} (age {}): withdrew {}, balance {}",
            state.year_index,
            state.age,
            requested,
            grown
        );

        Ok(LedgerRow {
            year_index: state.year_index,
            age: state.age,
            starting_balance,
            requested_withdrawal: requested,
            withdrawal: requested,
            growth: grown - remaining,
            balance_after_growth: grown,
        })
    }
}

impl<'l, 'a> IntoIterator for &'l Ledger<'a> {
    type Item = PlannerResult<LedgerRow>;
    type IntoIter = LedgerIter<'l, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over ledger rows; ends at the terminal state or the first error
#[derive(Debug, Clone)]
pub struct LedgerIter<'l, 'a> {
    ledger: &'l Ledger<'a>,
    state: DecumulationState,
    failed: bool,
}

impl LedgerIter<'_, '_> {
    /// State after the rows yielded so far
    pub fn state(&self) -> SimulationState {
        self.state.status
    }

    pub fn balance(&self) -> Money {
        self.state.balance
    }
}

impl Iterator for LedgerIter<'_, '_> {
    type Item = PlannerResult<LedgerRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.state.status.is_terminal() {
            return None;
        }

        let row = self.ledger.advance(&mut self.state);
        if row.is_err() {
            self.failed = true;
        }
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed || self.state.status.is_terminal() {
            return (0, Some(0));
        }
        let remaining = self.ledger.config.years.saturating_sub(self.state.year_index) as usize;
        (1, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::StrategyType;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use rust_decimal_macros::dec;

    fn config(years: u32, return_rate: Decimal, inflation_rate: Decimal) -> DecumulationConfig {
        DecumulationConfig {
            retirement_age: 65,
            years,
            return_rate,
            inflation_rate,
        }
    }

    #[test]
    fn test_fixed_withdrawal_without_growth() {
        let simulator = DecumulationSimulator::default();
        let strategy = WithdrawalStrategy::fixed_amount(dec!(10000));

        let result = simulator
            .simulate(dec!(100000), &strategy, config(5, dec!(0), dec!(0)))
            .unwrap();

        assert_eq!(result.rows.len(), 5);
        assert_eq!(result.state, SimulationState::HorizonReached);
        assert_eq!(result.final_balance(), dec!(50000));
        assert_eq!(result.rows[0].age, 65);
        assert_eq!(result.rows[4].age, 69);
        assert!(result.is_sustainable());
    }

    #[test]
    fn test_growth_applies_after_withdrawal() {
        let simulator = DecumulationSimulator::default();
        let strategy = WithdrawalStrategy::fixed_amount(dec!(10000));

        let result = simulator
            .simulate(dec!(100000), &strategy, config(1, dec!(10), dec!(0)))
            .unwrap();

        let row = &result.rows[0];
        assert_eq!(row.withdrawal, dec!(10000));
        assert_eq!(row.growth, dec!(9000));
        assert_eq!(row.balance_after_growth, dec!(99000));
    }

    #[test]
    fn test_depletion_pays_partial_withdrawal() {
        let simulator = DecumulationSimulator::default();
        let strategy = WithdrawalStrategy::fixed_amount(dec!(40000));

        let result = simulator
            .simulate(dec!(100000), &strategy, config(10, dec!(0), dec!(0)))
            .unwrap();

        // 100000 -> 60000 -> 20000 -> depleted in year 3
        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.state, SimulationState::Depleted { year_index: 3, age: 67 });
        assert_eq!(result.depletion_year(), Some(3));

        let last = &result.rows[2];
        assert_eq!(last.requested_withdrawal, dec!(40000));
        assert_eq!(last.withdrawal, dec!(20000));
        assert_eq!(last.shortfall(), dec!(20000));
        assert_eq!(last.balance_after_growth, Decimal::ZERO);
        assert_eq!(result.total_withdrawn(), dec!(100000));
        assert!(!result.is_sustainable());
    }

    #[test]
    fn test_inflation_raises_fixed_withdrawals() {
        let simulator = DecumulationSimulator::default();
        let strategy = WithdrawalStrategy {
            adjust_for_inflation: true,
            ..WithdrawalStrategy::fixed_amount(dec!(40000))
        };

        let result = simulator
            .simulate(dec!(1000000), &strategy, config(3, dec!(5), dec!(3)))
            .unwrap();

        assert_eq!(result.rows[0].withdrawal, dec!(40000));
        assert_eq!(result.rows[1].withdrawal, dec!(41200));
        assert_eq!(result.rows[2].withdrawal, dec!(42436));
    }

    #[test]
    fn test_zero_year_horizon() {
        let simulator = DecumulationSimulator::default();
        let strategy = WithdrawalStrategy::fixed_amount(dec!(40000));

        let result = simulator
            .simulate(dec!(100000), &strategy, config(0, dec!(5), dec!(3)))
            .unwrap();

        assert!(result.rows.is_empty());
        assert_eq!(result.state, SimulationState::HorizonReached);
        assert_eq!(result.final_balance(), dec!(100000));
    }

    #[test]
    fn test_invalid_strategy_refuses_to_start() {
        let simulator = DecumulationSimulator::default();
        let strategy = WithdrawalStrategy {
            withdrawal_rate: dec!(150),
            ..WithdrawalStrategy::percentage_based(dec!(4))
        };

        let result = simulator.ledger(dec!(100000), &strategy, config(20, dec!(5), dec!(3)));

        assert!(matches!(
            result,
            Err(PlannerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_negative_start_balance_rejected() {
        let simulator = DecumulationSimulator::default();
        let strategy = WithdrawalStrategy::fixed_amount(dec!(100));

        let result = simulator.simulate(dec!(-1), &strategy, config(5, dec!(5), dec!(3)));

        assert!(matches!(result, Err(PlannerError::NegativeBalance { .. })));
    }

    #[test]
    fn test_ledger_is_restartable() {
        let simulator = DecumulationSimulator::default();
        let strategy = WithdrawalStrategy::percentage_based(dec!(5));
        let ledger = simulator
            .ledger(dec!(500000), &strategy, config(25, dec!(6), dec!(3)))
            .unwrap();

        let first: Vec<LedgerRow> = ledger.iter().take(3).collect::<PlannerResult<_>>().unwrap();
        let full: Vec<LedgerRow> = ledger.iter().collect::<PlannerResult<_>>().unwrap();
        let again: Vec<LedgerRow> = (&ledger).into_iter().collect::<PlannerResult<_>>().unwrap();

        assert_eq!(full.len(), 25);
        assert_eq!(&full[..3], &first[..]);
        assert_eq!(full, again);
    }

    #[test]
    fn test_iterator_reports_terminal_state() {
        let simulator = DecumulationSimulator::default();
        let strategy = WithdrawalStrategy::fixed_amount(dec!(60000));
        let ledger = simulator
            .ledger(dec!(100000), &strategy, config(10, dec!(0), dec!(0)))
            .unwrap();

        let mut iter = ledger.iter();
        assert_eq!(iter.state(), SimulationState::Active);
        iter.next();
        assert_eq!(iter.state(), SimulationState::Active);
        assert_eq!(iter.balance(), dec!(40000));
        iter.next();
        assert_eq!(iter.state(), SimulationState::Depleted { year_index: 2, age: 66 });
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_floor_preserves_principal_over_horizon() {
        let simulator = DecumulationSimulator::default();
        let strategy = WithdrawalStrategy {
            minimum_balance: Some(dec!(100000)),
            ..WithdrawalStrategy::fixed_amount(dec!(30000))
        };

        let result = simulator
            .simulate(dec!(200000), &strategy, config(10, dec!(0), dec!(0)))
            .unwrap();

        assert!(result.is_sustainable());
        assert_eq!(result.final_balance(), dec!(100000));
        assert_eq!(result.rows[3].withdrawal, dec!(10000));
        assert_eq!(result.rows[4].withdrawal, Decimal::ZERO);
    }

    #[test]
    fn test_rmd_binds_retirement_age_from_config() {
        let simulator = DecumulationSimulator::default();
        // Age on the strategy is replaced by the run's retirement age
        let strategy = WithdrawalStrategy::required_minimum_distribution(0);
        let run_config = DecumulationConfig {
            retirement_age: 85,
            years: 1,
            return_rate: dec!(0),
            inflation_rate: dec!(0),
        };

        let ledger = simulator.ledger(dec!(160000), &strategy, run_config).unwrap();
        assert_eq!(
            ledger.strategy().strategy_type,
            StrategyType::RequiredMinimumDistribution { retirement_age: 85 }
        );

        let result = ledger.run().unwrap();
        assert_eq!(result.rows[0].withdrawal, dec!(10000));
    }

    #[test]
    fn test_custom_rmd_table_from_assumptions() {
        let assumptions = Assumptions {
            rmd: RmdTable::from_entries(vec![(65, dec!(4))]).unwrap(),
        };
        let simulator = DecumulationSimulator::new(assumptions);
        let strategy = WithdrawalStrategy::required_minimum_distribution(65);

        let result = simulator
            .simulate(dec!(1000), &strategy, config(2, dec!(0), dec!(0)))
            .unwrap();

        assert_eq!(result.rows[0].withdrawal, dec!(250));
        assert_eq!(result.rows[1].withdrawal, dec!(187.5));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_unsustainable_withdrawals_deplete_within_horizon(
            balance in 1_000i64..2_000_000,
            excess_bp in 200i64..5_000,
            return_bp in 0i64..800,
            years in 100u32..121,
        ) {
            let balance = Decimal::from(balance);
            let return_rate = Decimal::new(return_bp, 2);
            // More than the first year's growth, less than the whole balance
            let amount = balance * (percent_to_fraction(return_rate) + Decimal::new(excess_bp, 4));
            let strategy = WithdrawalStrategy::fixed_amount(amount);

            let result = DecumulationSimulator::default()
                .simulate(balance, &strategy, config(years, return_rate, dec!(0)))
                .unwrap();

            let year = result.depletion_year();
            prop_assert!(year.is_some());
            if let Some(year) = year {
                prop_assert!(year > 1);
                prop_assert!(year <= years);
                prop_assert_eq!(result.rows.len() as u32, year);
            }
            for row in &result.rows {
                prop_assert!(row.balance_after_growth >= Decimal::ZERO);
            }
        }

        #[test]
        fn prop_ledger_balances_never_negative(
            balance in 0i64..2_000_000,
            amount in 0i64..200_000,
            return_bp in -2_000i64..1_500,
            inflation_bp in 0i64..800,
            years in 0u32..70,
            adjust in proptest::bool::ANY,
        ) {
            let strategy = WithdrawalStrategy {
                adjust_for_inflation: adjust,
                ..WithdrawalStrategy::fixed_amount(Decimal::from(amount))
            };

            let result = DecumulationSimulator::default()
                .simulate(
                    Decimal::from(balance),
                    &strategy,
                    config(years, Decimal::new(return_bp, 2), Decimal::new(inflation_bp, 2)),
                )
                .unwrap();

            prop_assert!(result.state.is_terminal());
            prop_assert!(result.rows.len() as u32 <= years);
            for row in &result.rows {
                prop_assert!(row.balance_after_growth >= Decimal::ZERO);
                prop_assert!(row.withdrawal <= row.starting_balance);
            }
            if let Some(year) = result.depletion_year() {
                prop_assert!(year <= years);
                prop_assert_eq!(result.rows.len() as u32, year);
            }
        }
    }
}
