//! SQLite error mapping.
//!
//! Maps `tokio_rusqlite::Error` and `rusqlite::Error` to `StoreError` from
//! `healthsync_core::storage`. Specific errors are mapped to semantic variants
//! (e.g., "table already exists" to AlreadyExists).

use healthsync_core::storage::StoreError;

/// Extracts the SQLite result code and message from errors that carry them.
///
/// Statements prepared by `execute_batch` report failures as `SqlInputError`
/// (with the offending offset) rather than `SqliteFailure`.
fn sqlite_failure(err: &rusqlite::Error) -> Option<(rusqlite::ErrorCode, &str)> {
    match err {
        rusqlite::Error::SqliteFailure(sqlite_err, message) => {
            Some((sqlite_err.code, message.as_deref().unwrap_or_default()))
        }
        rusqlite::Error::SqlInputError { error, msg, .. } => Some((error.code, msg.as_str())),
        _ => None,
    }
}

/// Returns true if the error is a constraint violation caused by a single row.
///
/// These are reported as row failures instead of failing the whole batch.
pub fn is_row_violation(err: &rusqlite::Error) -> bool {
    matches!(
        sqlite_failure(err),
        Some((rusqlite::ErrorCode::ConstraintViolation, _))
    )
}

/// Maps a rusqlite error to a StoreError.
///
/// # Error Mapping
///
/// - `table ... already exists` → `StoreError::AlreadyExists`
/// - `no such table` → `StoreError::NotFound`
/// - `SQLITE_FULL` → `StoreError::QuotaExceeded`
/// - `SQLITE_READONLY` / `SQLITE_PERM` → `StoreError::PermissionDenied`
/// - Connection errors → `StoreError::ConnectionFailed`
/// - Constraint violations → `StoreError::InvalidData`
/// - All other errors → `StoreError::QueryFailed`
fn map_rusqlite_error(err: &rusqlite::Error, table: &str) -> StoreError {
    let Some((code, message)) = sqlite_failure(err) else {
        return StoreError::QueryFailed(err.to_string());
    };

    if message.contains("already exists") {
        return StoreError::AlreadyExists {
            entity_type: "Table",
            id: table.to_string(),
        };
    }

    if message.starts_with("no such table") {
        return StoreError::NotFound {
            entity_type: "Table",
            id: table.to_string(),
        };
    }

    match code {
        rusqlite::ErrorCode::DiskFull => {
            StoreError::QuotaExceeded(format!("Database full while writing {table}"))
        }
        rusqlite::ErrorCode::ReadOnly | rusqlite::ErrorCode::PermissionDenied => {
            StoreError::PermissionDenied(err.to_string())
        }
        rusqlite::ErrorCode::CannotOpen
        | rusqlite::ErrorCode::DatabaseBusy
        | rusqlite::ErrorCode::DatabaseLocked => StoreError::ConnectionFailed(err.to_string()),
        rusqlite::ErrorCode::ConstraintViolation => {
            StoreError::InvalidData(format!("Constraint violation in {table}: {err}"))
        }
        _ => StoreError::QueryFailed(err.to_string()),
    }
}

/// Maps a tokio_rusqlite error to a StoreError.
///
/// This is the main entry point for error mapping in async code.
pub fn map_tokio_rusqlite_error(err: tokio_rusqlite::Error, table: &str) -> StoreError {
    match &err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => map_rusqlite_error(rusqlite_err, table),
        tokio_rusqlite::Error::ConnectionClosed | tokio_rusqlite::Error::Close(_) => {
            StoreError::ConnectionFailed("Connection closed unexpectedly".to_string())
        }
        _ => StoreError::QueryFailed(err.to_string()),
    }
}
