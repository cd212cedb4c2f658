use serde::Serialize;
use uuid::Uuid;

use crate::storage::{InsertReport, ObjectRef, RowFailure, StoreError, TableId};

use super::error::LookupMiss;

/// Result of writing one partition's batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Every row was accepted.
    Committed { rows: usize },
    /// The batch was accepted but some rows were refused.
    CommittedWithPartialFailures {
        rows: usize,
        failed: Vec<RowFailure>,
    },
    /// Nothing was written.
    Failed(StoreError),
}

impl InsertOutcome {
    pub fn from_report(report: InsertReport) -> Self {
        if report.rejected.is_empty() {
            InsertOutcome::Committed {
                rows: report.inserted,
            }
        } else {
            InsertOutcome::CommittedWithPartialFailures {
                rows: report.inserted,
                failed: report.rejected,
            }
        }
    }

    pub fn is_committed(&self) -> bool {
        !matches!(self, InsertOutcome::Failed(_))
    }
}

impl From<Result<InsertReport, StoreError>> for InsertOutcome {
    fn from(result: Result<InsertReport, StoreError>) -> Self {
        match result {
            Ok(report) => InsertOutcome::from_report(report),
            Err(error) => InsertOutcome::Failed(error),
        }
    }
}

/// A committed partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionReport {
    pub member_id: i64,
    pub table_id: TableId,
    pub committed: usize,
    pub rejected: Vec<RowFailure>,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub source: ObjectRef,
    pub rows_parsed: usize,
    pub rows_enriched: usize,
    pub rows_committed: usize,
    pub rows_rejected: usize,
    pub lookup_misses: Vec<LookupMiss>,
    /// Committed partitions in ascending member id order.
    pub partitions: Vec<PartitionReport>,
    pub source_deleted: bool,
}

/// What handling a storage event amounted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    Skipped { reason: String },
    Completed(RunSummary),
}
