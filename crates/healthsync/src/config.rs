use std::{env, path::PathBuf, time::Duration};

use clap::ValueEnum;

use healthsync_core::pipeline::{
    ConfigError, PipelineConfig, DEFAULT_MAX_CONCURRENCY, DEFAULT_RUN_TIMEOUT_SECS,
    DEFAULT_TABLE_PREFIX,
};
use healthsync_core::storage::ObjectRef;

/// Where reference tables come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReferenceMode {
    /// Tables compiled into the binary.
    #[default]
    Bundled,
    /// CSV objects read from the object store.
    Objects,
}

impl ReferenceMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bundled" => Some(ReferenceMode::Bundled),
            "objects" => Some(ReferenceMode::Objects),
            _ => None,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file (default: "healthsync.db")
    pub sqlite_path: String,
    /// Directory holding one subdirectory per bucket (default: ".")
    pub object_root: PathBuf,
    /// Prefix of member table names (default: "Member_")
    pub table_prefix: String,
    /// Partitions persisted at once (default: 8)
    pub max_concurrency: usize,
    /// Whole-run deadline in seconds (default: 540)
    pub run_timeout_seconds: u64,
    /// Reference table source (default: bundled)
    pub references: ReferenceMode,
    /// Bucket holding the reference CSVs (default: "healthapp")
    pub reference_bucket: String,
    /// Sleep reference object name (default: "cdc_sleep_hours_lookup.csv")
    pub sleep_reference: String,
    /// Calorie reference object name (default: "cdc_calorie_needs_lookup.csv")
    pub calorie_reference: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `HEALTHSYNC_SQLITE_PATH` - SQLite database path (default: "healthsync.db")
    /// - `HEALTHSYNC_OBJECT_ROOT` - Object store root directory (default: ".")
    /// - `HEALTHSYNC_TABLE_PREFIX` - Member table prefix (default: "Member_")
    /// - `HEALTHSYNC_MAX_CONCURRENCY` - Concurrent partitions (default: 8)
    /// - `HEALTHSYNC_RUN_TIMEOUT_SECS` - Run deadline in seconds (default: 540)
    /// - `HEALTHSYNC_REFERENCES` - `bundled` or `objects` (default: bundled)
    /// - `HEALTHSYNC_REFERENCE_BUCKET` - Reference bucket (default: "healthapp")
    /// - `HEALTHSYNC_SLEEP_REFERENCE` - Sleep reference object (default: "cdc_sleep_hours_lookup.csv")
    /// - `HEALTHSYNC_CALORIE_REFERENCE` - Calorie reference object (default: "cdc_calorie_needs_lookup.csv")
    pub fn from_env() -> Self {
        Self {
            sqlite_path: env::var("HEALTHSYNC_SQLITE_PATH")
                .unwrap_or_else(|_| "healthsync.db".to_string()),
            object_root: env::var("HEALTHSYNC_OBJECT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            table_prefix: env::var("HEALTHSYNC_TABLE_PREFIX")
                .unwrap_or_else(|_| DEFAULT_TABLE_PREFIX.to_string()),
            max_concurrency: env::var("HEALTHSYNC_MAX_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_CONCURRENCY),
            run_timeout_seconds: env::var("HEALTHSYNC_RUN_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RUN_TIMEOUT_SECS),
            references: env::var("HEALTHSYNC_REFERENCES")
                .ok()
                .and_then(|v| ReferenceMode::parse(&v))
                .unwrap_or_default(),
            reference_bucket: env::var("HEALTHSYNC_REFERENCE_BUCKET")
                .unwrap_or_else(|_| "healthapp".to_string()),
            sleep_reference: env::var("HEALTHSYNC_SLEEP_REFERENCE")
                .unwrap_or_else(|_| "cdc_sleep_hours_lookup.csv".to_string()),
            calorie_reference: env::var("HEALTHSYNC_CALORIE_REFERENCE")
                .unwrap_or_else(|_| "cdc_calorie_needs_lookup.csv".to_string()),
        }
    }

    /// Get the run deadline as a Duration.
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_seconds)
    }

    /// Validated pipeline settings.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        PipelineConfig::new(
            self.table_prefix.clone(),
            self.max_concurrency,
            self.run_timeout(),
        )
    }

    pub fn sleep_reference_object(&self) -> ObjectRef {
        ObjectRef::new(&self.reference_bucket, &self.sleep_reference)
    }

    pub fn calorie_reference_object(&self) -> ObjectRef {
        ObjectRef::new(&self.reference_bucket, &self.calorie_reference)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            sqlite_path: "test.db".to_string(),
            object_root: PathBuf::from("/data"),
            table_prefix: "Member_".to_string(),
            max_concurrency: 4,
            run_timeout_seconds: 60,
            references: ReferenceMode::Objects,
            reference_bucket: "healthapp".to_string(),
            sleep_reference: "sleep.csv".to_string(),
            calorie_reference: "calorie.csv".to_string(),
        }
    }

    #[test]
    fn test_run_timeout_conversion() {
        assert_eq!(config().run_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_pipeline_config_validation() {
        let valid = config().pipeline_config().unwrap();
        assert_eq!(valid.max_concurrency(), 4);

        let zero = Config {
            max_concurrency: 0,
            ..config()
        };
        assert_eq!(zero.pipeline_config(), Err(ConfigError::InvalidConcurrency));

        let bad_prefix = Config {
            table_prefix: "Member-".to_string(),
            ..config()
        };
        assert!(matches!(
            bad_prefix.pipeline_config(),
            Err(ConfigError::InvalidTablePrefix(_))
        ));
    }

    #[test]
    fn test_reference_objects() {
        assert_eq!(
            config().sleep_reference_object(),
            ObjectRef::new("healthapp", "sleep.csv")
        );
        assert_eq!(
            config().calorie_reference_object().to_string(),
            "healthapp/calorie.csv"
        );
    }

    #[test]
    fn test_reference_mode_parse() {
        assert_eq!(ReferenceMode::parse(" Objects "), Some(ReferenceMode::Objects));
        assert_eq!(ReferenceMode::parse("bundled"), Some(ReferenceMode::Bundled));
        assert_eq!(ReferenceMode::parse("s3"), None);
    }

    #[test]
    fn test_default_values() {
        // Clear environment variables to test defaults
        for var in [
            "HEALTHSYNC_SQLITE_PATH",
            "HEALTHSYNC_OBJECT_ROOT",
            "HEALTHSYNC_TABLE_PREFIX",
            "HEALTHSYNC_MAX_CONCURRENCY",
            "HEALTHSYNC_RUN_TIMEOUT_SECS",
            "HEALTHSYNC_REFERENCES",
            "HEALTHSYNC_REFERENCE_BUCKET",
            "HEALTHSYNC_SLEEP_REFERENCE",
            "HEALTHSYNC_CALORIE_REFERENCE",
        ] {
            env::remove_var(var);
        }

        let config = Config::from_env();

        assert_eq!(config.sqlite_path, "healthsync.db");
        assert_eq!(config.object_root, PathBuf::from("."));
        assert_eq!(config.table_prefix, "Member_");
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.run_timeout_seconds, 540);
        assert_eq!(config.references, ReferenceMode::Bundled);
        assert_eq!(
            config.sleep_reference_object(),
            ObjectRef::new("healthapp", "cdc_sleep_hours_lookup.csv")
        );
        assert_eq!(
            config.calorie_reference_object(),
            ObjectRef::new("healthapp", "cdc_calorie_needs_lookup.csv")
        );
    }
}
