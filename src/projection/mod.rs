//! Projection engines for the accumulation and decumulation phases

mod accumulation;
mod state;
mod engine;
mod ledger;

pub use accumulation::project_balance;
pub use state::{DecumulationState, SimulationState};
pub use engine::{DecumulationConfig, DecumulationSimulator, Ledger, LedgerIter};
pub use ledger::{write_ledger_csv, LedgerRow, SimulationResult, SimulationSummary};
