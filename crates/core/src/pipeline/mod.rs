mod config;
mod enrich;
mod error;
mod event;
mod outcome;
mod partition;
mod stage;

pub use config::{
    ConfigError, PipelineConfig, DEFAULT_MAX_CONCURRENCY, DEFAULT_RUN_TIMEOUT_SECS,
    DEFAULT_TABLE_PREFIX,
};
pub use enrich::{enrich, enrich_all, Enrichment};
pub use error::{LookupMiss, MissingBand, ParseError, PartitionError, PartitionFailure, RunFailure};
pub use event::{StorageEvent, DELETED_RESOURCE_STATE};
pub use outcome::{EventOutcome, InsertOutcome, PartitionReport, RunSummary};
pub use partition::{partition, Partition};
pub use stage::PipelineStage;
