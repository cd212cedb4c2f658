//! SQLite table backend.
//!
//! One SQLite table per member, using `rusqlite` for synchronous operations and
//! `tokio-rusqlite` for async wrapping.

mod backend;
mod conversions;
mod error;
mod schema;

pub use backend::SqliteTableBackend;
