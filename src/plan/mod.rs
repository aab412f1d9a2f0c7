//! Plan data structures: scenarios, contributions and withdrawal strategies

mod data;
mod strategy;
pub mod loader;

pub use data::{Contribution, ContributionSummary, RetirementScenario};
pub use strategy::{StrategyType, WithdrawalStrategy};
pub use loader::{
    load_contributions, load_contributions_from_reader, load_scenarios,
    load_scenarios_from_reader, load_strategies, load_strategies_from_reader,
};
