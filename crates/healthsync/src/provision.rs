//! Per-member table provisioning and batch writes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use healthsync_core::member::EnrichedRecord;
use healthsync_core::pipeline::InsertOutcome;
use healthsync_core::storage::{member_table_schema, StoreError, TableBackend, TableId, TableSchema};

/// Member tables on top of a `TableBackend`.
///
/// `ensure_table` is single-flight per table: concurrent callers for the same
/// table share one existence check and at most one create call. A successful
/// ensure is remembered for the lifetime of this value; a failed one is retried
/// by the next caller.
pub struct MemberTables {
    backend: Arc<dyn TableBackend>,
    schema: TableSchema,
    ensured: Mutex<HashMap<TableId, Arc<OnceCell<()>>>>,
}

impl MemberTables {
    pub fn new(backend: Arc<dyn TableBackend>) -> Self {
        Self {
            backend,
            schema: member_table_schema(),
            ensured: Mutex::new(HashMap::new()),
        }
    }

    /// Makes sure `table` exists, creating it if needed.
    pub async fn ensure_table(&self, table: &TableId) -> Result<(), StoreError> {
        let cell = {
            let mut ensured = self.ensured.lock().await;
            ensured.entry(table.clone()).or_default().clone()
        };

        cell.get_or_try_init(|| self.provision(table)).await?;
        Ok(())
    }

    async fn provision(&self, table: &TableId) -> Result<(), StoreError> {
        if self.backend.table_exists(table).await? {
            tracing::debug!(table_id = %table, "Table already present");
            return Ok(());
        }

        match self.backend.create_table(table, &self.schema).await {
            Ok(()) => {
                tracing::info!(table_id = %table, "Created member table");
                Ok(())
            }
            // Another process created it between our check and our create.
            Err(StoreError::AlreadyExists { .. }) => {
                tracing::debug!(table_id = %table, "Table created concurrently");
                Ok(())
            }
            Err(error) => {
                tracing::warn!(table_id = %table, %error, "Table provisioning failed");
                Err(error)
            }
        }
    }

    /// Appends `records` to `table` in one request, preserving their order.
    ///
    /// Rows the store refuses are logged and reported but never fail the batch.
    pub async fn insert_batch(&self, table: &TableId, records: &[EnrichedRecord]) -> InsertOutcome {
        let outcome = InsertOutcome::from(self.backend.insert_rows(table, records).await);

        match &outcome {
            InsertOutcome::Committed { rows } => {
                tracing::debug!(table_id = %table, rows, "Batch committed");
            }
            InsertOutcome::CommittedWithPartialFailures { rows, failed } => {
                for failure in failed {
                    let member_id = records.get(failure.row).map(EnrichedRecord::member_id);
                    tracing::warn!(
                        table_id = %table,
                        row = failure.row,
                        member_id,
                        reason = %failure.reason,
                        "Row rejected"
                    );
                }
                tracing::info!(
                    table_id = %table,
                    rows,
                    rejected = failed.len(),
                    "Batch committed with rejected rows"
                );
            }
            InsertOutcome::Failed(error) => {
                tracing::warn!(table_id = %table, %error, "Batch insert failed");
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryTableBackend;
    use chrono::NaiveDate;
    use healthsync_core::member::{Gender, MemberRecord, Recommendations};
    use std::time::Duration;

    fn record(member_id: i64, hours_sleep: u32) -> EnrichedRecord {
        EnrichedRecord::new(
            MemberRecord {
                member_id,
                first_name: "Bruno".to_string(),
                last_name: "Costa".to_string(),
                gender: Gender::Male,
                age: 45,
                height: 1.82,
                weight: 85,
                hours_sleep,
                calories_consumed: 2500,
                exercise_calories_burned: 450,
                date: NaiveDate::from_ymd_opt(2020, 5, 21).unwrap(),
            },
            Recommendations {
                recommended_min_sleep: 7,
                recommended_max_sleep: 9,
                recommended_sedentary_calories: 2200,
                recommended_moderate_calories: 2400,
                recommended_active_calories: 2800,
            },
        )
    }

    #[tokio::test]
    async fn test_concurrent_ensures_create_once() {
        let backend = InMemoryTableBackend::new().with_latency(Duration::from_millis(20));
        let tables = MemberTables::new(Arc::new(backend.clone()));
        let table = TableId::for_member("Member_", 1);

        let (a, b, c) = tokio::join!(
            tables.ensure_table(&table),
            tables.ensure_table(&table),
            tables.ensure_table(&table)
        );

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(backend.create_calls(), 1);
        assert!(backend.table_exists(&table).await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_existing_table_is_noop() {
        let backend = InMemoryTableBackend::new();
        let table = TableId::for_member("Member_", 1);
        backend
            .create_table(&table, &member_table_schema())
            .await
            .unwrap();
        let tables = MemberTables::new(Arc::new(backend.clone()));

        tables.ensure_table(&table).await.unwrap();
        tables.ensure_table(&table).await.unwrap();

        assert_eq!(backend.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_separate_handles_tolerate_already_exists() {
        let backend = InMemoryTableBackend::new().with_latency(Duration::from_millis(20));
        let first = MemberTables::new(Arc::new(backend.clone()));
        let second = MemberTables::new(Arc::new(backend.clone()));
        let table = TableId::for_member("Member_", 3);

        let (a, b) = tokio::join!(first.ensure_table(&table), second.ensure_table(&table));

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(backend.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_ensure_is_retried() {
        let backend = InMemoryTableBackend::new();
        let table = TableId::for_member("Member_", 2);
        backend
            .fail_creates(
                table.clone(),
                StoreError::ConnectionFailed("refused".to_string()),
            )
            .await;
        let tables = MemberTables::new(Arc::new(backend.clone()));

        let first = tables.ensure_table(&table).await;
        backend.heal().await;
        let second = tables.ensure_table(&table).await;

        assert!(matches!(first, Err(StoreError::ConnectionFailed(_))));
        assert!(second.is_ok());
        assert_eq!(backend.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_insert_batch_outcomes() {
        let backend = InMemoryTableBackend::new().with_row_filter(|r| {
            (r.member.hours_sleep > 24).then(|| "hours_sleep out of range".to_string())
        });
        let tables = MemberTables::new(Arc::new(backend.clone()));
        let table = TableId::for_member("Member_", 1);
        tables.ensure_table(&table).await.unwrap();

        let clean = tables.insert_batch(&table, &[record(1, 7)]).await;
        let partial = tables
            .insert_batch(&table, &[record(1, 8), record(1, 25)])
            .await;
        let missing = tables
            .insert_batch(&TableId::for_member("Member_", 9), &[record(9, 7)])
            .await;

        assert_eq!(clean, InsertOutcome::Committed { rows: 1 });
        assert!(matches!(
            partial,
            InsertOutcome::CommittedWithPartialFailures { rows: 1, ref failed } if failed[0].row == 1
        ));
        assert!(matches!(missing, InsertOutcome::Failed(StoreError::NotFound { .. })));
        assert_eq!(backend.rows(&table).await.len(), 2);
    }
}
