use thiserror::Error;

/// Name of the sleep reference table, used in error messages.
pub const SLEEP_TABLE: &str = "sleep";

/// Name of the calorie reference table, used in error messages.
pub const CALORIE_TABLE: &str = "calorie";

/// Errors that can occur when loading or validating a reference table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("{table} reference unavailable: {reason}")]
    Unavailable { table: &'static str, reason: String },
    #[error("{table} reference is empty")]
    Empty { table: &'static str },
    #[error("{table} band {band} has min age above max age")]
    InvertedAges { table: &'static str, band: String },
    #[error("{table} band {band} has min sleep hours above max sleep hours")]
    InvertedSleepHours { table: &'static str, band: String },
    #[error("{table} bands {first} and {second} overlap")]
    Overlap {
        table: &'static str,
        first: String,
        second: String,
    },
    #[error("{table} bands leave {gap} uncovered")]
    Gap { table: &'static str, gap: String },
}
