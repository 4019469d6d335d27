//! Bucket name resolution.
//!
//! The registry maps each [`BucketKind`] to its physical table name
//! (`prefix + configured name`). It is built without touching the database;
//! [`ensure_schema`](BucketRegistry::ensure_schema) provisions the tables
//! when the caller asks for it.

use crate::config::BucketNames;
use crate::error::Result;
use crate::model::{Bucket, BucketKind};
use crate::storage::migrations::{SqliteDialect, SqliteQueryInterface, quote_ident, up};
use rusqlite::Connection;
use tracing::info;

/// Physical table names for the six buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRegistry {
    tables: [String; 6],
}

impl BucketRegistry {
    /// Resolve every bucket's table name as `prefix + names[bucket]`.
    #[must_use]
    pub fn configure(prefix: &str, names: &BucketNames) -> Self {
        Self {
            tables: BucketKind::ALL.map(|kind| format!("{prefix}{}", names.get(kind))),
        }
    }

    /// Table that stores `kind`.
    #[must_use]
    pub fn table(&self, kind: BucketKind) -> &str {
        &self.tables[kind as usize]
    }

    /// Table that stores `bucket`; every permission bucket shares one table.
    #[must_use]
    pub fn table_for(&self, bucket: &Bucket) -> &str {
        self.table(bucket.kind())
    }

    /// `(bucket, table)` pairs in provisioning order.
    pub fn iter(&self) -> impl Iterator<Item = (BucketKind, &str)> {
        BucketKind::ALL
            .into_iter()
            .map(|kind| (kind, self.table(kind)))
    }

    /// Create any missing bucket tables. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns an error if a `CREATE TABLE` statement fails.
    pub fn ensure_schema(&self, conn: &Connection) -> Result<()> {
        up(&mut SqliteQueryInterface::new(conn), &SqliteDialect, self)?;
        info!(tables = self.tables.len(), "Schema ensured");
        Ok(())
    }

    /// Delete every row from every bucket table.
    ///
    /// # Errors
    ///
    /// Returns an error if a table is missing or the delete fails.
    pub fn clean(&self, conn: &Connection) -> Result<usize> {
        let mut removed = 0;
        for (_, table) in self.iter() {
            removed += conn.execute(&format!("DELETE FROM {}", quote_ident(table)), [])?;
        }
        info!(rows = removed, "Cleaned all buckets");
        Ok(removed)
    }
}
