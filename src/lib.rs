//! aclstore - relational set storage for ACL engines
//!
//! This crate stores the six buckets an access-control-list engine works
//! with (`meta`, `parents`, `permissions`, `resources`, `roles`, `users`)
//! in SQLite tables of `(key, value)` rows, and exposes the operations such
//! an engine needs: `get`, `union`, and batched `add` / `remove` / `del`.
//!
//! # Architecture
//!
//! - [`model`] - Buckets, value sequences, permission documents
//! - [`storage`] - SQLite set storage, batches, table provisioning
//! - [`config`] - Adapter configuration and path resolution
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling
//!
//! # Example
//!
//! ```
//! use aclstore::config::AdapterConfig;
//! use aclstore::model::Bucket;
//! use aclstore::storage::SqliteBackend;
//!
//! let storage = SqliteBackend::open_memory(&AdapterConfig::default())?;
//! let roles = Bucket::parse("roles")?;
//! let perms = Bucket::parse("resources_allows_article")?;
//!
//! let mut batch = storage.begin();
//! storage.add(&mut batch, &roles, "admin", ["alice", "bob"])?;
//! storage.add(&mut batch, &perms, "admin", ["read", "write"])?;
//! storage.commit(&mut batch)?;
//!
//! assert_eq!(storage.get(&perms, "admin")?, ["read", "write"]);
//! # Ok::<(), aclstore::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod validate;

pub use error::{Error, Result};

/// Global silent mode flag for `--silent` output.
///
/// When set, commands print only the values they read, one per line.
pub static SILENT: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Check if silent mode is active.
#[inline]
pub fn is_silent() -> bool {
    SILENT.load(std::sync::atomic::Ordering::Relaxed)
}
