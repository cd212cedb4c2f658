//! SQLite table backend implementation.
//!
//! Implements `TableBackend` from `healthsync_core::storage` using SQLite.

use std::path::Path;

use async_trait::async_trait;
use tokio_rusqlite::Connection;

use healthsync_core::member::EnrichedRecord;
use healthsync_core::storage::{
    member_table_schema, InsertReport, Result, RowFailure, StoreError, TableBackend, TableId,
    TableSchema,
};

use super::conversions::{record_to_values, row_to_record};
use super::error::{is_row_violation, map_tokio_rusqlite_error};
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// SQLite-based table backend.
///
/// Every member table lives in the same database file.
pub struct SqliteTableBackend {
    conn: Connection,
}

impl SqliteTableBackend {
    /// Opens a file-based database, creating the file if needed.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        Ok(Self { conn })
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing - data is lost when the backend is dropped.
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        Ok(Self { conn })
    }

    /// Reads back every row of a member table, oldest first.
    pub async fn rows(&self, table: &TableId) -> Result<Vec<EnrichedRecord>> {
        let sql = schema::select_all_sql(table, &member_table_schema());
        let table_name = table.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql).map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_record).map_err(wrap_err)?;

                let mut records = Vec::new();
                for row_result in rows {
                    records.push(row_result.map_err(wrap_err)?);
                }
                Ok(records)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, &table_name))
    }
}

#[async_trait]
impl TableBackend for SqliteTableBackend {
    async fn table_exists(&self, table: &TableId) -> Result<bool> {
        let table_name = table.to_string();
        let param = table_name.clone();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_TABLE_EXISTS)
                    .map_err(wrap_err)?;
                stmt.exists([&param]).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, &table_name))
    }

    async fn create_table(&self, table: &TableId, table_schema: &TableSchema) -> Result<()> {
        let sql = schema::create_table_sql(table, table_schema);
        let table_name = table.to_string();

        self.conn
            .call(move |conn| {
                conn.execute_batch(&sql).map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, &table_name))
    }

    async fn insert_rows(&self, table: &TableId, rows: &[EnrichedRecord]) -> Result<InsertReport> {
        let sql = schema::insert_sql(table, &member_table_schema());
        let table_name = table.to_string();
        let values: Vec<_> = rows.iter().map(record_to_values).collect();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let mut report = InsertReport::default();

                {
                    let mut stmt = tx.prepare(&sql).map_err(wrap_err)?;
                    for (row, params) in values.iter().enumerate() {
                        match stmt.execute(rusqlite::params_from_iter(params.iter())) {
                            Ok(_) => report.inserted += 1,
                            Err(e) if is_row_violation(&e) => report.rejected.push(RowFailure {
                                row,
                                reason: e.to_string(),
                            }),
                            // Dropping the transaction rolls back every row of the batch.
                            Err(e) => return Err(wrap_err(e)),
                        }
                    }
                }

                tx.commit().map_err(wrap_err)?;
                Ok(report)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, &table_name))
    }
}
