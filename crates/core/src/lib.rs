//! Functional core of healthsync.
//!
//! Pure types and transformations for enriching member fitness records with
//! reference health targets and splitting them into per-member partitions.
//! Everything that touches the outside world sits behind the traits in
//! [`storage`] and lives in the `healthsync` crate.

pub mod member;
pub mod pipeline;
pub mod reference;
pub mod serde;
pub mod storage;
