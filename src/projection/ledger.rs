//! Ledger output structures for decumulation runs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::SimulationState;
use crate::error::PlannerResult;
use crate::money::{round_currency, Money};

/// A single year of the retirement ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    /// 1 for the first year of retirement
    pub year_index: u32,
    pub age: u32,

    pub starting_balance: Money,

    /// What the strategy asked for
    pub requested_withdrawal: Money,

    /// What was actually paid out (less than requested only in the depletion year)
    pub withdrawal: Money,

    pub growth: Money,
    pub balance_after_growth: Money,
}

impl LedgerRow {
    /// Shortfall between the requested and paid withdrawal
    pub fn shortfall(&self) -> Money {
        self.requested_withdrawal - self.withdrawal
    }

    /// Copy with every amount rounded to currency precision
    pub fn rounded(&self) -> Self {
        Self {
            year_index: self.year_index,
            age: self.age,
            starting_balance: round_currency(self.starting_balance),
            requested_withdrawal: round_currency(self.requested_withdrawal),
            withdrawal: round_currency(self.withdrawal),
            growth: round_currency(self.growth),
            balance_after_growth: round_currency(self.balance_after_growth),
        }
    }
}

/// Complete decumulation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub strategy_id: Uuid,
    pub starting_balance: Money,

    /// Yearly ledger rows
    pub rows: Vec<LedgerRow>,

    /// Terminal state
    pub state: SimulationState,
}

impl SimulationResult {
    pub fn new(strategy_id: Uuid, starting_balance: Money) -> Self {
        Self {
            strategy_id,
            starting_balance,
            rows: Vec::new(),
            state: SimulationState::Active,
        }
    }

    /// Add a ledger row
    pub fn add_row(&mut self, row: LedgerRow) {
        self.rows.push(row);
    }

    /// Year of retirement in which the balance ran out
    pub fn depletion_year(&self) -> Option<u32> {
        match self.state {
            SimulationState::Depleted { year_index, .. } => Some(year_index),
            _ => None,
        }
    }

    /// Age at which the balance ran out
    pub fn depletion_age(&self) -> Option<u32> {
        match self.state {
            SimulationState::Depleted { age, .. } => Some(age),
            _ => None,
        }
    }

    pub fn is_sustainable(&self) -> bool {
        self.state == SimulationState::HorizonReached
    }

    pub fn total_withdrawn(&self) -> Money {
        self.rows.iter().map(|r| r.withdrawal).sum()
    }

    pub fn final_balance(&self) -> Money {
        self.rows
            .last()
            .map(|r| r.balance_after_growth)
            .unwrap_or(self.starting_balance)
    }

    /// Get summary statistics
    pub fn summary(&self) -> SimulationSummary {
        let total_growth: Decimal = self.rows.iter().map(|r| r.growth).sum();
        let total_shortfall: Decimal = self.rows.iter().map(|r| r.shortfall()).sum();

        SimulationSummary {
            years_simulated: self.rows.len() as u32,
            starting_balance: round_currency(self.starting_balance),
            total_withdrawn: round_currency(self.total_withdrawn()),
            total_growth: round_currency(total_growth),
            total_shortfall: round_currency(total_shortfall),
            final_balance: round_currency(self.final_balance()),
            depletion_year: self.depletion_year(),
            sustainable: self.is_sustainable(),
        }
    }
}

/// Summary statistics for a simulation, rounded for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub years_simulated: u32,
    pub starting_balance: Money,
    pub total_withdrawn: Money,
    pub total_growth: Money,
    pub total_shortfall: Money,
    pub final_balance: Money,
    pub depletion_year: Option<u32>,
    pub sustainable: bool,
}

/// Write ledger rows as CSV, amounts rounded to currency precision
pub fn write_ledger_csv<W: std::io::Write>(writer: W, rows: &[LedgerRow]) -> PlannerResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row.rounded())?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(year_index: u32, requested: Decimal, paid: Decimal, end: Decimal) -> LedgerRow {
        LedgerRow {
            year_index,
            age: 64 + year_index,
            starting_balance: dec!(100000),
            requested_withdrawal: requested,
            withdrawal: paid,
            growth: dec!(0),
            balance_after_growth: end,
        }
    }

    #[test]
    fn test_result_totals() {
        let mut result = SimulationResult::new(Uuid::nil(), dec!(100000));
        result.add_row(row(1, dec!(40000), dec!(40000), dec!(60000)));
        result.add_row(row(2, dec!(70000), dec!(60000), dec!(0)));
        result.state = SimulationState::Depleted { year_index: 2, age: 66 };

        assert_eq!(result.total_withdrawn(), dec!(100000));
        assert_eq!(result.final_balance(), dec!(0));
        assert_eq!(result.depletion_year(), Some(2));
        assert_eq!(result.depletion_age(), Some(66));
        assert!(!result.is_sustainable());

        let summary = result.summary();
        assert_eq!(summary.years_simulated, 2);
        assert_eq!(summary.total_shortfall, dec!(10000));
    }

    #[test]
    fn test_empty_result_keeps_starting_balance() {
        let mut result = SimulationResult::new(Uuid::nil(), dec!(1234.5));
        result.state = SimulationState::HorizonReached;

        assert_eq!(result.final_balance(), dec!(1234.5));
        assert!(result.is_sustainable());
        assert_eq!(result.depletion_year(), None);
    }

    #[test]
    fn test_write_ledger_csv_rounds_amounts() {
        let rows = vec![row(1, dec!(41200.004), dec!(41200.004), dec!(58799.996))];

        let mut buffer = Vec::new();
        write_ledger_csv(&mut buffer, &rows).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("year_index,age,starting_balance,requested_withdrawal,withdrawal,growth,balance_after_growth")
        );
        assert_eq!(lines.next(), Some("1,65,100000,41200.00,41200.00,0,58800.00"));
    }
}
