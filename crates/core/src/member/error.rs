use thiserror::Error;

/// Errors that can occur when normalizing a raw member field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Invalid height: {0}")]
    InvalidHeight(String),
    #[error("Invalid date (expected MM/DD/YYYY or YYYY-MM-DD): {0}")]
    InvalidDate(String),
    #[error("Invalid gender (expected M or F): {0}")]
    InvalidGender(String),
}
