//! Year-by-year state for a decumulation run

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Simulation lifecycle: `Active` until one of the two terminal states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum SimulationState {
    Active,
    /// Balance ran out during `year_index`
    Depleted { year_index: u32, age: u32 },
    /// Every year of the horizon was funded
    HorizonReached,
}

impl SimulationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SimulationState::Active)
    }
}

/// Running state of a single simulation
#[derive(Debug, Clone)]
pub struct DecumulationState {
    /// Last completed year of retirement (0 before the first year)
    pub year_index: u32,

    /// Attained age in the current year
    pub age: u32,

    /// Balance carried into the next year
    pub balance: Money,

    pub status: SimulationState,

    retirement_age: u32,
}

impl DecumulationState {
    /// State at the start of retirement
    ///
    /// A zero-year horizon is already complete.
    pub fn at_retirement(starting_balance: Money, retirement_age: u32, years: u32) -> Self {
        Self {
            year_index: 0,
            age: retirement_age,
            balance: starting_balance,
            status: if years == 0 {
                SimulationState::HorizonReached
            } else {
                SimulationState::Active
            },
            retirement_age,
        }
    }

    /// Move to the next year of retirement
    pub fn advance_year(&mut self) {
        self.year_index += 1;
        self.age = self.retirement_age + self.year_index - 1;
    }
}
