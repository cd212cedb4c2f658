//! Backend implementations.
//!
//! Concrete implementations of the storage traits defined in
//! `healthsync_core::storage`.
//!
//! # Feature Flags
//!
//! - `sqlite` (default): SQLite table backend using `rusqlite` and `tokio-rusqlite`
//!
//! The in-memory backends and the filesystem object store are always available.

pub mod fs;
pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use fs::FsObjectStore;
pub use inmemory::{InMemoryObjectStore, InMemoryTableBackend};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteTableBackend;
