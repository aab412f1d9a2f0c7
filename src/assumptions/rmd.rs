//! Required Minimum Distribution (RMD) divisor table
//!
//! Distribution periods by attained age. The withdrawal for a year is
//! `balance / divisor(age)`, so a falling divisor drives a rising share
//! of the balance out each year.

use std::sync::OnceLock;

use rust_decimal::Decimal;

use crate::error::{PlannerError, PlannerResult};

/// Uniform Lifetime distribution periods, ages 72-120, in tenths of a year
const UNIFORM_LIFETIME_TENTHS: [(u32, i64); 49] = [
    (72, 274),
    (73, 265),
    (74, 255),
    (75, 246),
    (76, 237),
    (77, 229),
    (78, 220),
    (79, 211),
    (80, 202),
    (81, 194),
    (82, 185),
    (83, 177),
    (84, 168),
    (85, 160),
    (86, 152),
    (87, 144),
    (88, 137),
    (89, 129),
    (90, 122),
    (91, 115),
    (92, 108),
    (93, 101),
    (94, 95),
    (95, 89),
    (96, 84),
    (97, 78),
    (98, 73),
    (99, 68),
    (100, 64),
    (101, 60),
    (102, 56),
    (103, 52),
    (104, 49),
    (105, 46),
    (106, 43),
    (107, 41),
    (108, 39),
    (109, 37),
    (110, 35),
    (111, 34),
    (112, 33),
    (113, 31),
    (114, 30),
    (115, 29),
    (116, 28),
    (117, 27),
    (118, 25),
    (119, 23),
    (120, 20),
];

#[derive(Debug, Clone, PartialEq)]
pub struct RmdTable {
    /// (age, divisor), ages strictly increasing, divisors non-increasing
    divisors: Vec<(u32, Decimal)>,
}

impl Default for RmdTable {
    fn default() -> Self {
        Self::uniform_lifetime()
    }
}

impl RmdTable {
    /// Built-in Uniform Lifetime table
    pub fn uniform_lifetime() -> Self {
        Self {
            divisors: UNIFORM_LIFETIME_TENTHS
                .iter()
                .map(|&(age, tenths)| (age, Decimal::new(tenths, 1)))
                .collect(),
        }
    }

    /// Process-wide copy of the built-in table
    pub fn shared() -> &'static RmdTable {
        static TABLE: OnceLock<RmdTable> = OnceLock::new();
        TABLE.get_or_init(RmdTable::uniform_lifetime)
    }

    /// Build a table from (age, divisor) entries
    ///
    /// Rejects empty tables, divisors below 1 (the withdrawal would exceed the
    /// balance), ages out of order and divisors that rise with age.
    pub fn from_entries(mut divisors: Vec<(u32, Decimal)>) -> PlannerResult<Self> {
        if divisors.is_empty() {
            return Err(PlannerError::InvalidTable {
                reason: "table has no entries".to_string(),
            });
        }

        divisors.sort_by_key(|(age, _)| *age);

        for (age, divisor) in &divisors {
            if *divisor < Decimal::ONE {
                return Err(PlannerError::InvalidTable {
                    reason: format!("divisor {} at age {} is below 1", divisor, age),
                });
            }
        }

        for pair in divisors.windows(2) {
            let (age_a, div_a) = pair[0];
            let (age_b, div_b) = pair[1];
            if age_a == age_b {
                return Err(PlannerError::InvalidTable {
                    reason: format!("duplicate entry for age {}", age_a),
                });
            }
            if div_b > div_a {
                return Err(PlannerError::InvalidTable {
                    reason: format!(
                        "divisor rises from {} at age {} to {} at age {}",
                        div_a, age_a, div_b, age_b
                    ),
                });
            }
        }

        Ok(Self { divisors })
    }

    /// Divisor for an attained age
    ///
    /// Uses the nearest entry at or above `age`; ages past the end of the
    /// table use the last entry.
    pub fn divisor(&self, age: u32) -> Decimal {
        let idx = self.divisors.partition_point(|(a, _)| *a < age);
        match self.divisors.get(idx) {
            Some((_, divisor)) => *divisor,
            // Non-empty by construction
            None => self.divisors[self.divisors.len() - 1].1,
        }
    }

    /// Distribution rate (1 / divisor) for reporting
    pub fn rate(&self, age: u32) -> Decimal {
        Decimal::ONE / self.divisor(age)
    }

    pub fn min_age(&self) -> u32 {
        self.divisors[0].0
    }

    pub fn max_age(&self) -> u32 {
        self.divisors[self.divisors.len() - 1].0
    }

    pub fn entries(&self) -> &[(u32, Decimal)] {
        &self.divisors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal_macros::dec;

    #[test]
    fn test_uniform_lifetime_divisors() {
        let table = RmdTable::uniform_lifetime();

        assert_eq!(table.min_age(), 72);
        assert_eq!(table.max_age(), 120);
        assert_eq!(table.divisor(73), dec!(26.5));
        assert_eq!(table.divisor(85), dec!(16.0));
        assert_eq!(table.divisor(120), dec!(2.0));
    }

    #[test]
    fn test_rates_match_reciprocal_divisors() {
        let table = RmdTable::default();

        // 1 / 26.5 at 73, 1 / 16 at 85
        assert_relative_eq!(table.rate(73).to_f64().unwrap(), 0.0377358490566038, epsilon = 1e-12);
        assert_relative_eq!(table.rate(85).to_f64().unwrap(), 0.0625, epsilon = 1e-12);
    }

    #[test]
    fn test_clamps_to_table_bounds() {
        let table = RmdTable::uniform_lifetime();

        // Below the table uses the first entry, above uses the last
        assert_eq!(table.divisor(60), dec!(27.4));
        assert_eq!(table.divisor(130), dec!(2.0));
    }

    #[test]
    fn test_gap_uses_next_entry_at_or_above() {
        let table = RmdTable::from_entries(vec![
            (70, dec!(20)),
            (80, dec!(10)),
            (90, dec!(5)),
        ])
        .unwrap();

        assert_eq!(table.divisor(70), dec!(20));
        assert_eq!(table.divisor(71), dec!(10));
        assert_eq!(table.divisor(80), dec!(10));
        assert_eq!(table.divisor(85), dec!(5));
        assert_eq!(table.divisor(95), dec!(5));
    }

    #[test]
    fn test_divisors_monotonic() {
        let table = RmdTable::uniform_lifetime();
        for pair in table.entries().windows(2) {
            assert!(pair[1].1 <= pair[0].1, "divisor rises at age {}", pair[1].0);
        }
    }

    #[test]
    fn test_from_entries_rejects_bad_tables() {
        assert!(matches!(
            RmdTable::from_entries(vec![]),
            Err(PlannerError::InvalidTable { .. })
        ));
        assert!(RmdTable::from_entries(vec![(72, dec!(0.5))]).is_err());
        assert!(RmdTable::from_entries(vec![(72, dec!(20)), (73, dec!(21))]).is_err());
        assert!(RmdTable::from_entries(vec![(72, dec!(20)), (72, dec!(19))]).is_err());
    }

    #[test]
    fn test_from_entries_sorts_by_age() {
        let table = RmdTable::from_entries(vec![(80, dec!(10)), (70, dec!(20))]).unwrap();
        assert_eq!(table.min_age(), 70);
        assert_eq!(table.divisor(75), dec!(10));
    }
}
