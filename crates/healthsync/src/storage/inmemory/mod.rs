//! In-memory backends for testing.
//!
//! Tables and objects live in HashMaps wrapped in `Arc<RwLock<_>>`. The table
//! backend can inject latency and failures so pipeline behavior under partial
//! failure and contention can be exercised without a real store.
//!
//! # Example
//!
//! ```rust,ignore
//! use healthsync::storage::inmemory::InMemoryTableBackend;
//!
//! let backend = InMemoryTableBackend::new().with_latency(Duration::from_millis(20));
//! ```

mod objects;
mod tables;

pub use objects::InMemoryObjectStore;
pub use tables::{InMemoryTableBackend, RowFilter};
