//! healthsync: enrich member fitness exports with reference health targets
//! and load them into one table per member.
//!
//! The pure logic lives in `healthsync_core`; this crate wires it to object
//! stores, table backends and the command line.

pub mod config;
pub mod decode;
pub mod orchestrator;
pub mod provision;
pub mod references;
pub mod storage;

pub use orchestrator::Pipeline;
