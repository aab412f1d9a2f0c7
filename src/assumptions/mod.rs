//! Planning assumptions: distribution tables shared by every simulation

mod rmd;
pub mod loader;

pub use rmd::RmdTable;

use std::path::Path;

use crate::error::PlannerResult;

/// Container for all simulation assumptions
#[derive(Debug, Clone, Default)]
pub struct Assumptions {
    pub rmd: RmdTable,
}

impl Assumptions {
    /// Built-in tables
    pub fn default_tables() -> Self {
        Self {
            rmd: RmdTable::uniform_lifetime(),
        }
    }

    /// Load assumptions from CSV files in the default location (data/assumptions/)
    pub fn from_csv() -> PlannerResult<Self> {
        Self::from_csv_path(Path::new(loader::DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load assumptions from CSV files in a specific directory
    pub fn from_csv_path(path: &Path) -> PlannerResult<Self> {
        let divisors = loader::load_rmd_divisors(path)?;
        log::debug!("Loaded {} RMD divisors from {}", divisors.len(), path.display());

        Ok(Self {
            rmd: RmdTable::from_entries(divisors)?,
        })
    }
}
