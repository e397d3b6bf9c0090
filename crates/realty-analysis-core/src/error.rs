use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RealtyError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid loan parameters: {field}: {reason}")]
    InvalidLoanParameters { field: String, reason: String },

    #[error("Unsupported strategy: '{0}' (expected rental, flip, brrrr, house_hack or appreciation)")]
    UnsupportedStrategy(String),

    #[error("Unsupported loan type: '{0}' (expected conventional, fha, va or usda)")]
    UnsupportedLoanType(String),

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for RealtyError {
    fn from(e: serde_json::Error) -> Self {
        RealtyError::SerializationError(e.to_string())
    }
}

impl RealtyError {
    pub(crate) fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        RealtyError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_loan(field: &str, reason: impl Into<String>) -> Self {
        RealtyError::InvalidLoanParameters {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
