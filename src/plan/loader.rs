//! Load scenarios, strategies and contributions from CSV
//!
//! Persistence proper belongs to the surrounding application; these loaders
//! read the flat exports it produces.

use std::path::Path;

use chrono::{NaiveDate, Utc};
use csv::Reader;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{Contribution, RetirementScenario, StrategyType, WithdrawalStrategy};
use crate::error::{PlannerError, PlannerResult};

/// Raw CSV row for a scenario
#[derive(Debug, serde::Deserialize)]
struct ScenarioRow {
    #[serde(rename = "ScenarioID")]
    scenario_id: Option<Uuid>,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "CurrentAge")]
    current_age: u32,
    #[serde(rename = "RetirementAge")]
    retirement_age: u32,
    #[serde(rename = "LifeExpectancyAge")]
    life_expectancy_age: u32,
    #[serde(rename = "CurrentSavings")]
    current_savings: Decimal,
    #[serde(rename = "AnnualContribution")]
    annual_contribution: Decimal,
    #[serde(rename = "ExpectedReturnRate")]
    expected_return_rate: Decimal,
    #[serde(rename = "InflationRate")]
    inflation_rate: Decimal,
    #[serde(rename = "ProjectedAnnualIncome")]
    projected_annual_income: Decimal,
    #[serde(rename = "ProjectedAnnualExpenses")]
    projected_annual_expenses: Decimal,
    #[serde(rename = "Notes", default)]
    notes: Option<String>,
}

impl ScenarioRow {
    fn into_scenario(self) -> RetirementScenario {
        let now = Utc::now();
        RetirementScenario {
            scenario_id: self.scenario_id.unwrap_or_else(Uuid::new_v4),
            name: self.name,
            current_age: self.current_age,
            retirement_age: self.retirement_age,
            life_expectancy_age: self.life_expectancy_age,
            current_savings: self.current_savings,
            annual_contribution: self.annual_contribution,
            expected_return_rate: self.expected_return_rate,
            inflation_rate: self.inflation_rate,
            projected_annual_income: self.projected_annual_income,
            projected_annual_expenses: self.projected_annual_expenses,
            notes: self.notes.filter(|n| !n.is_empty()),
            created_at: now,
            last_updated: now,
        }
    }
}

/// Raw CSV row for a withdrawal strategy
#[derive(Debug, serde::Deserialize)]
struct StrategyRow {
    #[serde(rename = "StrategyID")]
    strategy_id: Option<Uuid>,
    #[serde(rename = "ScenarioID")]
    scenario_id: Uuid,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "StrategyType")]
    strategy_type: String,
    #[serde(rename = "WithdrawalRate")]
    withdrawal_rate: Decimal,
    #[serde(rename = "AnnualWithdrawalAmount")]
    annual_withdrawal_amount: Decimal,
    #[serde(rename = "AdjustForInflation")]
    adjust_for_inflation: bool,
    #[serde(rename = "MinimumBalance", default)]
    minimum_balance: Option<Decimal>,
    #[serde(rename = "BlendWeight", default)]
    blend_weight: Option<Decimal>,
    #[serde(rename = "Notes", default)]
    notes: Option<String>,
}

impl StrategyRow {
    fn into_strategy(self) -> PlannerResult<WithdrawalStrategy> {
        let strategy_type = match self.strategy_type.as_str() {
            "FixedAmount" => StrategyType::FixedAmount,
            "PercentageBased" => StrategyType::PercentageBased,
            "Dynamic" => match self.blend_weight {
                Some(blend_weight) => StrategyType::Dynamic { blend_weight },
                None => StrategyType::dynamic(),
            },
            // Retirement age is bound from the scenario at simulation time
            "RequiredMinimumDistribution" | "RMD" => {
                StrategyType::RequiredMinimumDistribution { retirement_age: 0 }
            }
            other => {
                return Err(PlannerError::Parse {
                    field: "StrategyType".to_string(),
                    value: other.to_string(),
                })
            }
        };

        Ok(WithdrawalStrategy {
            strategy_id: self.strategy_id.unwrap_or_else(Uuid::new_v4),
            scenario_id: self.scenario_id,
            name: self.name,
            strategy_type,
            withdrawal_rate: self.withdrawal_rate,
            annual_withdrawal_amount: self.annual_withdrawal_amount,
            adjust_for_inflation: self.adjust_for_inflation,
            minimum_balance: self.minimum_balance,
            notes: self.notes.filter(|n| !n.is_empty()),
        })
    }
}

/// Raw CSV row for a contribution
#[derive(Debug, serde::Deserialize)]
struct ContributionRow {
    #[serde(rename = "ContributionID")]
    contribution_id: Option<Uuid>,
    #[serde(rename = "ScenarioID")]
    scenario_id: Uuid,
    #[serde(rename = "Amount")]
    amount: Decimal,
    #[serde(rename = "ContributionDate")]
    contribution_date: String,
    #[serde(rename = "AccountName")]
    account_name: String,
    #[serde(rename = "IsEmployerMatch")]
    is_employer_match: bool,
    #[serde(rename = "Notes", default)]
    notes: Option<String>,
}

impl ContributionRow {
    fn into_contribution(self) -> PlannerResult<Contribution> {
        let contribution_date = NaiveDate::parse_from_str(&self.contribution_date, "%Y-%m-%d")
            .map_err(|_| PlannerError::Parse {
                field: "ContributionDate".to_string(),
                value: self.contribution_date.clone(),
            })?;

        Ok(Contribution {
            contribution_id: self.contribution_id.unwrap_or_else(Uuid::new_v4),
            scenario_id: self.scenario_id,
            amount: self.amount,
            contribution_date,
            account_name: self.account_name,
            is_employer_match: self.is_employer_match,
            notes: self.notes.filter(|n| !n.is_empty()),
            created_at: Utc::now(),
        })
    }
}

/// Load all scenarios from a CSV file
pub fn load_scenarios<P: AsRef<Path>>(path: P) -> PlannerResult<Vec<RetirementScenario>> {
    let reader = Reader::from_path(path)?;
    read_scenarios(reader)
}

/// Load scenarios from any reader (e.g., string buffer, network stream)
pub fn load_scenarios_from_reader<R: std::io::Read>(
    reader: R,
) -> PlannerResult<Vec<RetirementScenario>> {
    read_scenarios(Reader::from_reader(reader))
}

fn read_scenarios<R: std::io::Read>(mut reader: Reader<R>) -> PlannerResult<Vec<RetirementScenario>> {
    let mut scenarios = Vec::new();
    for result in reader.deserialize() {
        let row: ScenarioRow = result?;
        scenarios.push(row.into_scenario());
    }
    Ok(scenarios)
}

/// Load all withdrawal strategies from a CSV file
pub fn load_strategies<P: AsRef<Path>>(path: P) -> PlannerResult<Vec<WithdrawalStrategy>> {
    let reader = Reader::from_path(path)?;
    read_strategies(reader)
}

/// Load withdrawal strategies from any reader
pub fn load_strategies_from_reader<R: std::io::Read>(
    reader: R,
) -> PlannerResult<Vec<WithdrawalStrategy>> {
    read_strategies(Reader::from_reader(reader))
}

fn read_strategies<R: std::io::Read>(
    mut reader: Reader<R>,
) -> PlannerResult<Vec<WithdrawalStrategy>> {
    let mut strategies = Vec::new();
    for result in reader.deserialize() {
        let row: StrategyRow = result?;
        strategies.push(row.into_strategy()?);
    }
    Ok(strategies)
}

/// Load all contributions from a CSV file
pub fn load_contributions<P: AsRef<Path>>(path: P) -> PlannerResult<Vec<Contribution>> {
    let reader = Reader::from_path(path)?;
    read_contributions(reader)
}

/// Load contributions from any reader
pub fn load_contributions_from_reader<R: std::io::Read>(
    reader: R,
) -> PlannerResult<Vec<Contribution>> {
    read_contributions(Reader::from_reader(reader))
}

fn read_contributions<R: std::io::Read>(mut reader: Reader<R>) -> PlannerResult<Vec<Contribution>> {
    let mut contributions = Vec::new();
    for result in reader.deserialize() {
        let row: ContributionRow = result?;
        contributions.push(row.into_contribution()?);
    }
    Ok(contributions)
}
