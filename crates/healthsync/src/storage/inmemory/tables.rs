//! In-memory table backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use healthsync_core::member::EnrichedRecord;
use healthsync_core::storage::{
    InsertReport, Result, RowFailure, StoreError, TableBackend, TableId, TableSchema,
};

/// Decides per row whether the store refuses it; `Some(reason)` rejects.
pub type RowFilter = Arc<dyn Fn(&EnrichedRecord) -> Option<String> + Send + Sync>;

/// In-memory table backend for testing.
///
/// Clones share the same tables and counters.
#[derive(Clone, Default)]
pub struct InMemoryTableBackend {
    tables: Arc<RwLock<HashMap<TableId, Vec<EnrichedRecord>>>>,
    create_failures: Arc<RwLock<HashMap<TableId, StoreError>>>,
    insert_failures: Arc<RwLock<HashMap<TableId, StoreError>>>,
    row_filter: Option<RowFilter>,
    latency: Option<Duration>,
    create_calls: Arc<AtomicUsize>,
    insert_calls: Arc<AtomicUsize>,
    inserts_in_flight: Arc<AtomicUsize>,
    peak_inserts: Arc<AtomicUsize>,
}

impl InMemoryTableBackend {
    /// Creates a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every create and insert call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Rejects individual rows for which `filter` returns a reason.
    pub fn with_row_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&EnrichedRecord) -> Option<String> + Send + Sync + 'static,
    {
        self.row_filter = Some(Arc::new(filter));
        self
    }

    /// Makes every `create_table` call for `table` fail with `error`.
    pub async fn fail_creates(&self, table: TableId, error: StoreError) {
        self.create_failures.write().await.insert(table, error);
    }

    /// Makes every `insert_rows` call for `table` fail with `error`.
    pub async fn fail_inserts(&self, table: TableId, error: StoreError) {
        self.insert_failures.write().await.insert(table, error);
    }

    /// Removes all injected failures.
    pub async fn heal(&self) {
        self.create_failures.write().await.clear();
        self.insert_failures.write().await.clear();
    }

    /// Rows stored in `table`, in insertion order.
    pub async fn rows(&self, table: &TableId) -> Vec<EnrichedRecord> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.tables.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of `create_table` calls received, successful or not.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of `insert_rows` calls received, successful or not.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    /// Highest number of `insert_rows` calls observed running at once.
    pub fn peak_concurrent_inserts(&self) -> usize {
        self.peak_inserts.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

/// Tracks one in-flight insert for the peak counter.
struct InFlight<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TableBackend for InMemoryTableBackend {
    async fn table_exists(&self, table: &TableId) -> Result<bool> {
        Ok(self.tables.read().await.contains_key(table))
    }

    async fn create_table(&self, table: &TableId, _schema: &TableSchema) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if let Some(error) = self.create_failures.read().await.get(table) {
            return Err(error.clone());
        }

        let mut tables = self.tables.write().await;
        if tables.contains_key(table) {
            return Err(StoreError::AlreadyExists {
                entity_type: "Table",
                id: table.to_string(),
            });
        }
        tables.insert(table.clone(), Vec::new());
        Ok(())
    }

    async fn insert_rows(&self, table: &TableId, rows: &[EnrichedRecord]) -> Result<InsertReport> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight::enter(&self.inserts_in_flight, &self.peak_inserts);
        self.simulate_latency().await;

        if let Some(error) = self.insert_failures.read().await.get(table) {
            return Err(error.clone());
        }

        let mut tables = self.tables.write().await;
        let stored = tables.get_mut(table).ok_or_else(|| StoreError::NotFound {
            entity_type: "Table",
            id: table.to_string(),
        })?;

        let mut report = InsertReport::default();
        for (row, record) in rows.iter().enumerate() {
            match self.row_filter.as_ref().and_then(|filter| filter(record)) {
                Some(reason) => report.rejected.push(RowFailure { row, reason }),
                None => {
                    stored.push(record.clone());
                    report.inserted += 1;
                }
            }
        }

        Ok(report)
    }
}
