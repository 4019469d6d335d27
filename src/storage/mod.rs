//! SQLite storage layer for aclstore.
//!
//! This module provides set storage over six bucket tables with:
//! - Plain buckets: one row per key holding a set of values
//! - Permission buckets: one row per bucket holding a keyed document
//! - Deferred writes grouped in ordered, fail-fast batches
//!
//! # Submodules
//!
//! - [`schema`] - Column layout for each bucket
//! - [`registry`] - Bucket to table name resolution and provisioning
//! - [`transaction`] - Batches of deferred operations
//! - [`sqlite`] - The SQLite set storage engine
//! - [`migrations`] - Table creation and removal for any dialect

pub mod migrations;
pub mod registry;
pub mod schema;
pub mod sqlite;
pub mod transaction;

pub use registry::BucketRegistry;
pub use sqlite::SqliteBackend;
pub use transaction::{Batch, BatchState, Operation};
