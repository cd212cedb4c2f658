use async_trait::async_trait;

use crate::member::EnrichedRecord;
use crate::reference::{CalorieBand, ReferenceError, SleepBand};

use super::{InsertReport, ObjectRef, Result, TableId, TableSchema};

/// A tabular backing store holding one table per member.
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Returns whether the table exists.
    async fn table_exists(&self, table: &TableId) -> Result<bool>;

    /// Creates the table.
    ///
    /// Returns `StoreError::AlreadyExists` if another creator got there first.
    async fn create_table(&self, table: &TableId, schema: &TableSchema) -> Result<()>;

    /// Appends rows in order, in a single request.
    ///
    /// Rows the store refuses individually are reported in the `InsertReport`;
    /// an `Err` means nothing was committed.
    async fn insert_rows(&self, table: &TableId, rows: &[EnrichedRecord]) -> Result<InsertReport>;
}

/// A bucketed object store holding source files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads the whole object.
    async fn read(&self, object: &ObjectRef) -> Result<Vec<u8>>;

    /// Deletes the object.
    async fn delete(&self, object: &ObjectRef) -> Result<()>;
}

/// Provides the raw (unvalidated) reference tables.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn sleep_bands(&self) -> std::result::Result<Vec<SleepBand>, ReferenceError>;

    async fn calorie_bands(&self) -> std::result::Result<Vec<CalorieBand>, ReferenceError>;
}
