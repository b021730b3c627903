use col_core::{EstimationError, RepositoryError};
use thiserror::Error;

/// Errors that can occur when loading reference data.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    /// `line` is the 1-based data row (the header is not counted).
    #[error("Invalid record on line {line}: {message}")]
    InvalidRecord { line: usize, message: String },

    #[error("Invalid bracket table: {0}")]
    InvalidTable(EstimationError),

    #[error("State '{0}' not found in database (load states first)")]
    StateNotFound(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for LoaderError {
    fn from(err: csv::Error) -> Self {
        LoaderError::CsvParse(err.to_string())
    }
}

impl LoaderError {
    pub(crate) fn invalid(
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidRecord {
            line,
            message: message.into(),
        }
    }
}
