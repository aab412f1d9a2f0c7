//! Scenario analyzer: accumulation and decumulation for one household plan
//!
//! Holds the assumptions once, then answers any number of questions about
//! scenarios and strategies without re-reading CSV files.

use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::error::PlannerResult;
use crate::money::{round_currency, Money};
use crate::plan::{RetirementScenario, WithdrawalStrategy};
use crate::projection::{
    project_balance, DecumulationConfig, DecumulationSimulator, SimulationResult,
};
use crate::Assumptions;

/// Result of running a scenario through both phases
#[derive(Debug, Clone, Serialize)]
pub struct RetirementOutlook {
    /// Projected savings at retirement, rounded to cents
    pub starting_balance: Money,

    pub result: SimulationResult,

    /// True iff the balance lasted to life expectancy
    pub sustainable: bool,
}

/// Headline figures for a scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub scenario_id: Uuid,
    pub name: String,
    pub years_to_retirement: u32,
    pub years_in_retirement: u32,
    pub projected_savings: Money,

    /// Expenses minus income; negative when income covers expenses
    pub annual_withdrawal_needed: Money,
}

/// One strategy's outcome in a comparison
#[derive(Debug)]
pub struct StrategyComparison {
    pub strategy_id: Uuid,
    pub strategy_name: String,
    pub outcome: PlannerResult<RetirementOutlook>,
}

impl StrategyComparison {
    pub fn is_sustainable(&self) -> bool {
        matches!(&self.outcome, Ok(outlook) if outlook.sustainable)
    }
}

/// Pre-loaded analyzer for scenario questions
#[derive(Debug, Clone)]
pub struct ScenarioAnalyzer {
    simulator: DecumulationSimulator,
}

impl ScenarioAnalyzer {
    /// Analyzer with the built-in tables
    pub fn new() -> Self {
        Self::with_assumptions(Assumptions::default_tables())
    }

    /// Load assumptions from the default CSV directory
    pub fn from_csv() -> PlannerResult<Self> {
        Ok(Self::with_assumptions(Assumptions::from_csv()?))
    }

    pub fn from_csv_path(path: &Path) -> PlannerResult<Self> {
        Ok(Self::with_assumptions(Assumptions::from_csv_path(path)?))
    }

    pub fn with_assumptions(assumptions: Assumptions) -> Self {
        Self {
            simulator: DecumulationSimulator::new(assumptions),
        }
    }

    pub fn assumptions(&self) -> &Assumptions {
        self.simulator.assumptions()
    }

    /// Balance at retirement, rounded to cents
    pub fn projected_savings_at_retirement(
        &self,
        scenario: &RetirementScenario,
    ) -> PlannerResult<Money> {
        let balance = project_balance(
            scenario.current_age,
            scenario.retirement_age,
            scenario.current_savings,
            scenario.annual_contribution,
            scenario.expected_return_rate,
        )?;
        Ok(round_currency(balance))
    }

    /// Expenses minus income, reported as-is
    pub fn annual_withdrawal_gap(&self, scenario: &RetirementScenario) -> Money {
        scenario.annual_withdrawal_gap()
    }

    /// Accumulate to retirement, then draw down to life expectancy
    pub fn simulate_retirement(
        &self,
        scenario: &RetirementScenario,
        strategy: &WithdrawalStrategy,
    ) -> PlannerResult<RetirementOutlook> {
        scenario.validate()?;

        let starting_balance = self.projected_savings_at_retirement(scenario)?;
        let strategy = strategy.for_scenario(scenario);
        let config = DecumulationConfig::from_scenario(scenario);

        let result = self.simulator.simulate(starting_balance, &strategy, config)?;
        let sustainable = result.is_sustainable();

        log::debug!(
            "Scenario '{}' with '{}': {} over {} years",
            scenario.name,
            strategy.name,
            if sustainable { "sustainable" } else { "depleted" },
            config.years
        );

        Ok(RetirementOutlook {
            starting_balance,
            result,
            sustainable,
        })
    }

    /// Headline figures for reporting
    pub fn summarize(&self, scenario: &RetirementScenario) -> PlannerResult<ScenarioSummary> {
        Ok(ScenarioSummary {
            scenario_id: scenario.scenario_id,
            name: scenario.name.clone(),
            years_to_retirement: scenario.years_to_retirement(),
            years_in_retirement: scenario.years_in_retirement(),
            projected_savings: self.projected_savings_at_retirement(scenario)?,
            annual_withdrawal_needed: self.annual_withdrawal_gap(scenario),
        })
    }

    /// Simulate every strategy against the same scenario in parallel
    ///
    /// Results keep the input order. A failing strategy does not stop the others.
    pub fn compare_strategies(
        &self,
        scenario: &RetirementScenario,
        strategies: &[WithdrawalStrategy],
    ) -> Vec<StrategyComparison> {
        strategies
            .par_iter()
            .map(|strategy| StrategyComparison {
                strategy_id: strategy.strategy_id,
                strategy_name: strategy.name.clone(),
                outcome: self.simulate_retirement(scenario, strategy),
            })
            .collect()
    }
}

impl Default for ScenarioAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
