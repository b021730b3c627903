use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the estimation engine.
///
/// None of these are transient: every computation is deterministic, so a
/// caller that receives one should surface it rather than retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EstimationError {
    /// A state record carries a zero, negative or missing value needed for
    /// the requested computation.
    #[error("invalid reference data for state '{state}': {field}")]
    InvalidStateData { state: String, field: String },

    /// The scaling primitive was asked to divide by a zero index.
    #[error("division by zero index")]
    DivisionByZero,

    /// No reference record exists for the requested state code.
    #[error("unknown state '{0}'")]
    UnknownState(String),

    /// The request itself is malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// No bracket covers the given taxable income.
    #[error("no tax bracket found for taxable income {0}")]
    NoMatchingBracket(Decimal),
}

impl EstimationError {
    pub fn invalid_state_data(
        state: &str,
        field: &str,
    ) -> Self {
        Self::InvalidStateData {
            state: state.to_string(),
            field: field.to_string(),
        }
    }
}
