//! Error types for projection and simulation

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    /// A scenario, strategy or contribution failed its explicit validation
    #[error("Invalid {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// Withdrawal requested against a negative balance
    #[error("Balance must not be negative, got {balance}")]
    NegativeBalance { balance: Decimal },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Invalid RMD divisor table: {reason}")]
    InvalidTable { reason: String },

    #[error("Cannot parse {field} from '{value}'")]
    Parse { field: String, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlannerError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        PlannerError::InvalidConfiguration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Field name for configuration errors (used to report the offending input)
    pub fn field(&self) -> Option<&str> {
        match self {
            PlannerError::InvalidConfiguration { field, .. } => Some(field),
            PlannerError::Parse { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type PlannerResult<T> = Result<T, PlannerError>;
