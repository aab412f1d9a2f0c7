//! CSV-based assumption loader
//!
//! Loads planning assumptions from CSV files in data/assumptions/

use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{PlannerError, PlannerResult};

/// Default path to assumptions directory
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions";

/// File holding the RMD distribution periods
pub const RMD_DIVISORS_FILE: &str = "rmd_divisors.csv";

/// Load RMD divisors from CSV
/// Returns Vec<(age, divisor)> in file order
pub fn load_rmd_divisors(path: &Path) -> PlannerResult<Vec<(u32, Decimal)>> {
    let file = File::open(path.join(RMD_DIVISORS_FILE))?;
    load_rmd_divisors_from_reader(file)
}

/// Load RMD divisors from any reader with an `age,divisor` header
pub fn load_rmd_divisors_from_reader<R: std::io::Read>(
    reader: R,
) -> PlannerResult<Vec<(u32, Decimal)>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut divisors = Vec::new();

    for result in reader.records() {
        let record = result?;
        let age: u32 = parse_field(&record, 0, "age")?;
        let divisor: Decimal = parse_field(&record, 1, "divisor")?;
        divisors.push((age, divisor));
    }

    Ok(divisors)
}

fn parse_field<T: FromStr>(record: &csv::StringRecord, index: usize, field: &str) -> PlannerResult<T> {
    let raw = record.get(index).unwrap_or("");
    raw.trim().parse().map_err(|_| PlannerError::Parse {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_load_rmd_divisors_from_reader() {
        let data = "age,divisor\n72,27.4\n73,26.5\n74, 25.5\n";
        let divisors = load_rmd_divisors_from_reader(data.as_bytes()).unwrap();

        assert_eq!(divisors.len(), 3);
        assert_eq!(divisors[0], (72, dec!(27.4)));
        assert_eq!(divisors[2], (74, dec!(25.5)));
    }

    #[test]
    fn test_load_rmd_divisors_rejects_garbage() {
        let data = "age,divisor\nseventy,27.4\n";
        let err = load_rmd_divisors_from_reader(data.as_bytes()).unwrap_err();
        assert_eq!(err.field(), Some("age"));
    }

    #[test]
    fn test_load_rmd_divisors_missing_column() {
        let data = "age\n72\n";
        let err = load_rmd_divisors_from_reader(data.as_bytes()).unwrap_err();
        assert_eq!(err.field(), Some("divisor"));
    }
}
