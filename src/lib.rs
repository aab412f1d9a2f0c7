//! Retirement Projection - savings growth and drawdown engine for household plans
//!
//! This library provides:
//! - Accumulation projection of savings up to retirement
//! - Withdrawal strategies (fixed, percentage, dynamic, RMD)
//! - Year-by-year decumulation ledgers with depletion detection
//! - Scenario analysis and parallel strategy comparison

pub mod error;
pub mod money;
pub mod plan;
pub mod assumptions;
pub mod projection;
pub mod scenario;

// Re-export commonly used types
pub use error::{PlannerError, PlannerResult};
pub use money::{Money, Rate};
pub use plan::{Contribution, RetirementScenario, StrategyType, WithdrawalStrategy};
pub use assumptions::{Assumptions, RmdTable};
pub use projection::{
    project_balance, DecumulationConfig, DecumulationSimulator, LedgerRow, SimulationResult,
    SimulationState,
};
pub use scenario::{RetirementOutlook, ScenarioAnalyzer, ScenarioSummary, StrategyComparison};
