//! Validated pipeline configuration.

use std::time::Duration;

use thiserror::Error;

use crate::storage::TableId;

/// Partitions persisted at the same time when nothing else is configured.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Whole-run deadline in seconds, matching the hosting platform's invocation limit.
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 540;

/// Prefix of every per-member destination table.
pub const DEFAULT_TABLE_PREFIX: &str = "Member_";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Max concurrency must be greater than 0")]
    InvalidConcurrency,
    #[error("Run timeout must be greater than 0")]
    InvalidTimeout,
    #[error("Invalid table prefix: {0:?}")]
    InvalidTablePrefix(String),
}

/// Configuration for a pipeline run (validated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    table_prefix: String,
    max_concurrency: usize,
    run_timeout: Duration,
}

impl PipelineConfig {
    /// Create and validate a config.
    ///
    /// The table prefix is interpolated into table names, so it is limited to
    /// ASCII letters, digits and underscores.
    pub fn new(
        table_prefix: impl Into<String>,
        max_concurrency: usize,
        run_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let table_prefix = table_prefix.into();

        if table_prefix.is_empty()
            || !table_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::InvalidTablePrefix(table_prefix));
        }
        if max_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        if run_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(Self {
            table_prefix,
            max_concurrency,
            run_timeout,
        })
    }

    /// Create with defaults (`Member_` prefix, 8 concurrent partitions, 540s deadline).
    pub fn with_defaults() -> Self {
        Self {
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            run_timeout: Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS),
        }
    }

    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn run_timeout(&self) -> Duration {
        self.run_timeout
    }

    /// Destination table for a member's records.
    pub fn table_id(&self, member_id: i64) -> TableId {
        TableId::for_member(&self.table_prefix, member_id)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}
