use serde::Serialize;
use thiserror::Error;

use crate::member::Gender;
use crate::reference::ReferenceError;
use crate::storage::{ObjectRef, StoreError, TableId};

use super::stage::PipelineStage;

/// The reference dimension a record could not be matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "band", rename_all = "snake_case")]
pub enum MissingBand {
    Sleep { age: u32 },
    Calorie { age: u32, gender: Gender },
}

/// A record whose age or gender has no matching band.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[error("member {member_id} (row {row}): {}", describe_missing(.missing))]
pub struct LookupMiss {
    pub member_id: i64,
    /// Zero-based position of the record in the parsed input.
    pub row: usize,
    pub missing: MissingBand,
}

fn describe_missing(missing: &MissingBand) -> String {
    match missing {
        MissingBand::Sleep { age } => format!("no sleep band for age {age}"),
        MissingBand::Calorie { age, gender } => {
            format!("no calorie band for age {age} and gender {gender}")
        }
    }
}

/// The source stream could not be decoded into member records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{}", describe_parse(.row, .reason))]
pub struct ParseError {
    /// One-based data row, when the failure is tied to a row.
    pub row: Option<usize>,
    pub reason: String,
}

impl ParseError {
    pub fn at_row(row: usize, reason: impl Into<String>) -> Self {
        Self {
            row: Some(row),
            reason: reason.into(),
        }
    }

    pub fn stream(reason: impl Into<String>) -> Self {
        Self {
            row: None,
            reason: reason.into(),
        }
    }
}

fn describe_parse(row: &Option<usize>, reason: &str) -> String {
    match row {
        Some(row) => format!("row {row}: {reason}"),
        None => reason.to_string(),
    }
}

/// Why a single partition could not be persisted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartitionError {
    #[error("Table provisioning failed: {0}")]
    Provision(StoreError),
    #[error("Insert failed: {0}")]
    Insert(StoreError),
    #[error("Partition task aborted: {0}")]
    Aborted(String),
}

/// A partition that did not commit, tagged with its key.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("member {member_id} ({table_id}): {error}")]
pub struct PartitionFailure {
    pub member_id: i64,
    pub table_id: TableId,
    pub error: PartitionError,
}

/// Fatal outcome of a pipeline run. The source object is never deleted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunFailure {
    #[error("Invalid event: {0}")]
    InvalidEvent(String),
    #[error("Reference load failed: {0}")]
    ReferenceLoad(#[from] ReferenceError),
    #[error("Source {object} unavailable: {cause}")]
    SourceUnavailable { object: ObjectRef, cause: StoreError },
    #[error("Parse failed: {0}")]
    Parse(#[from] ParseError),
    #[error("Persistence failed for {} partition(s): {}", .failed.len(), describe_failures(.failed))]
    Persistence {
        failed: Vec<PartitionFailure>,
        committed: usize,
    },
    #[error("Run timed out during {stage}")]
    Timeout { stage: PipelineStage },
}

impl RunFailure {
    /// Keys of the partitions that failed, if this is a persistence failure.
    pub fn failed_members(&self) -> Vec<i64> {
        match self {
            RunFailure::Persistence { failed, .. } => failed.iter().map(|f| f.member_id).collect(),
            _ => Vec::new(),
        }
    }
}

fn describe_failures(failed: &[PartitionFailure]) -> String {
    failed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
