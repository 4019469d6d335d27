//! SQLite storage implementation.
//!
//! [`SqliteBackend`] implements the set-storage contract over the six
//! bucket tables:
//!
//! - reads (`get`, `union`) run immediately and never fail on absence
//! - writes (`add`, `remove`, `del`) are appended to a [`Batch`] and run
//!   in order on [`commit`](SqliteBackend::commit)
//!
//! Plain buckets keep one row per key with a JSON array of values.
//! Permission buckets share the `permissions` table: the bucket name is the
//! row key and the operation key selects a field of the row's document.
//!
//! Every write is a read-modify-write on the shared connection with no
//! version check. Two writers updating the same key concurrently can lose
//! one of the updates.

use crate::config::AdapterConfig;
use crate::error::{Error, Result};
use crate::model::values::{union, union_all, without};
use crate::model::{Bucket, BucketKind, PermissionDocument, Values};
use crate::storage::migrations::quote_ident;
use crate::storage::registry::BucketRegistry;
use crate::storage::transaction::{Batch, BatchState, Operation};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// SQLite-based set storage.
#[derive(Debug)]
pub struct SqliteBackend {
    conn: Connection,
    registry: BucketRegistry,
    verbose: bool,
}

impl SqliteBackend {
    /// Wrap an open connection. Does no I/O; call
    /// [`ensure_schema`](Self::ensure_schema) to provision tables.
    #[must_use]
    pub fn new(conn: Connection, config: &AdapterConfig) -> Self {
        Self {
            conn,
            registry: BucketRegistry::configure(&config.table_prefix, &config.buckets),
            verbose: config.verbose,
        }
    }

    /// Open a database at the given path.
    ///
    /// Provisions the bucket tables when `config.auto_provision` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the connection
    /// cannot be established, or provisioning fails.
    pub fn open(path: &Path, config: &AdapterConfig) -> Result<Self> {
        Self::open_with_timeout(path, config, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the connection
    /// cannot be established, or provisioning fails.
    pub fn open_with_timeout(
        path: &Path,
        config: &AdapterConfig,
        timeout_ms: Option<u64>,
    ) -> Result<Self> {
        config.validate()?;
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            // Default 5 second timeout
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        let backend = Self::new(conn, config);
        if config.auto_provision {
            backend.ensure_schema()?;
        }
        Ok(backend)
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or
    /// provisioning fails.
    pub fn open_memory(config: &AdapterConfig) -> Result<Self> {
        config.validate()?;
        let backend = Self::new(Connection::open_in_memory()?, config);
        if config.auto_provision {
            backend.ensure_schema()?;
        }
        Ok(backend)
    }

    /// Get a reference to the underlying connection.
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    #[must_use]
    pub fn registry(&self) -> &BucketRegistry {
        &self.registry
    }

    /// Create any missing bucket tables. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if a `CREATE TABLE` fails.
    pub fn ensure_schema(&self) -> Result<()> {
        self.registry.ensure_schema(&self.conn)
    }

    /// Remove every row from every bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if a table is missing or the delete fails.
    pub fn clean(&self) -> Result<()> {
        self.registry.clean(&self.conn)?;
        Ok(())
    }

    // ===========
    // Batches
    // ===========

    /// Open a new, empty batch.
    #[must_use]
    pub fn begin(&self) -> Batch {
        Batch::new()
    }

    /// Execute the batch's operations in append order.
    ///
    /// Stops at the first failing operation and returns its error unchanged.
    /// Operations before it stay written; operations after it never run.
    /// The batch ends `Committed` or `Failed { unit }`.
    ///
    /// # Errors
    ///
    /// Returns `BatchClosed` if the batch was already committed, otherwise
    /// the first storage error.
    pub fn commit(&self, batch: &mut Batch) -> Result<()> {
        batch.ensure_open()?;
        batch.set_state(BatchState::Committing);

        let mut failure = None;
        for (unit, operation) in batch.operations().iter().enumerate() {
            if let Err(e) = self.execute(operation) {
                warn!(
                    unit,
                    op = operation.name(),
                    bucket = %operation.bucket(),
                    error = %e,
                    "Batch unit failed, skipping the rest"
                );
                failure = Some((unit, e));
                break;
            }
        }

        if let Some((unit, e)) = failure {
            batch.set_state(BatchState::Failed { unit });
            return Err(e);
        }

        batch.set_state(BatchState::Committed);
        info!(units = batch.len(), "Batch committed");
        Ok(())
    }

    // ===========
    // Reads
    // ===========

    /// Values stored at `key`, empty if there are none.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored value is malformed.
    pub fn get(&self, bucket: &Bucket, key: &str) -> Result<Vec<String>> {
        match bucket {
            Bucket::Permission(name) => Ok(self
                .fetch_document(name)?
                .map(|doc| doc.get(key).to_vec())
                .unwrap_or_default()),
            Bucket::Plain(_) => Ok(self.fetch_values(bucket, key)?.unwrap_or_default()),
        }
    }

    /// De-duplicated union of the values stored at each of `keys`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored value is malformed.
    pub fn union<S: AsRef<str>>(&self, bucket: &Bucket, keys: &[S]) -> Result<Vec<String>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        match bucket {
            Bucket::Permission(name) => Ok(self
                .fetch_document(name)?
                .map(|doc| doc.union(keys))
                .unwrap_or_default()),
            Bucket::Plain(_) => {
                let keys: Vec<&str> = keys.iter().map(AsRef::as_ref).collect();
                let table = self.registry.table_for(bucket);
                let mut flattened = Vec::new();

                for chunk in keys.chunks(MAX_KEYS_PER_STATEMENT) {
                    let sql = format!(
                        "SELECT value FROM {} WHERE key IN ({})",
                        quote_ident(table),
                        placeholders(chunk.len())
                    );
                    self.log_statement(&sql, table);

                    let mut stmt = self.conn.prepare(&sql)?;
                    let rows = stmt
                        .query_map(rusqlite::params_from_iter(chunk.iter()), |row| {
                            row.get::<_, String>(0)
                        })?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    for raw in rows {
                        flattened.extend(decode_values(&raw)?);
                    }
                }
                Ok(union_all(flattened))
            }
        }
    }

    // ===========
    // Deferred writes
    // ===========

    /// Queue a union of `values` into the set at `key`.
    ///
    /// # Errors
    ///
    /// Returns `BatchClosed` if the batch is no longer open.
    pub fn add(
        &self,
        batch: &mut Batch,
        bucket: &Bucket,
        key: &str,
        values: impl Into<Values>,
    ) -> Result<()> {
        batch.push(Operation::Add {
            bucket: bucket.clone(),
            key: key.to_string(),
            values: values.into(),
        })
    }

    /// Queue removal of `values` from the set at `key`.
    ///
    /// # Errors
    ///
    /// Returns `BatchClosed` if the batch is no longer open.
    pub fn remove(
        &self,
        batch: &mut Batch,
        bucket: &Bucket,
        key: &str,
        values: impl Into<Values>,
    ) -> Result<()> {
        batch.push(Operation::Remove {
            bucket: bucket.clone(),
            key: key.to_string(),
            values: values.into(),
        })
    }

    /// Queue deletion of `keys`.
    ///
    /// # Errors
    ///
    /// Returns `BatchClosed` if the batch is no longer open.
    pub fn del(&self, batch: &mut Batch, bucket: &Bucket, keys: impl Into<Values>) -> Result<()> {
        batch.push(Operation::Del {
            bucket: bucket.clone(),
            keys: keys.into(),
        })
    }

    // ===========
    // Execution
    // ===========

    fn execute(&self, operation: &Operation) -> Result<()> {
        match operation {
            Operation::Add {
                bucket: Bucket::Permission(name),
                key,
                values,
            } => self.add_permission(name, key, values.as_slice()),
            Operation::Add {
                bucket,
                key,
                values,
            } => self.add_plain(bucket, key, values.as_slice()),
            Operation::Remove {
                bucket: Bucket::Permission(name),
                key,
                values,
            } => self.remove_permission(name, key, values.as_slice()),
            Operation::Remove {
                bucket,
                key,
                values,
            } => self.remove_plain(bucket, key, values.as_slice()),
            Operation::Del {
                bucket: Bucket::Permission(name),
                keys,
            } => self.del_permission(name, keys.as_slice()),
            Operation::Del { bucket, keys } => self.del_plain(bucket, keys.as_slice()),
        }
    }

    fn add_plain(&self, bucket: &Bucket, key: &str, values: &[String]) -> Result<()> {
        match self.fetch_values(bucket, key)? {
            None => self.insert_row(self.registry.table_for(bucket), key, &encode(values)?),
            Some(existing) => self.update_row(
                self.registry.table_for(bucket),
                key,
                &encode(&union(values, &existing))?,
            ),
        }
    }

    // An emptied plain set stays as an empty-array row; only `del` removes it.
    fn remove_plain(&self, bucket: &Bucket, key: &str, values: &[String]) -> Result<()> {
        let Some(existing) = self.fetch_values(bucket, key)? else {
            return Ok(());
        };
        self.update_row(
            self.registry.table_for(bucket),
            key,
            &encode(&without(&existing, values))?,
        )
    }

    fn del_plain(&self, bucket: &Bucket, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let table = self.registry.table_for(bucket);
        let mut deleted = 0;
        for chunk in keys.chunks(MAX_KEYS_PER_STATEMENT) {
            let sql = format!(
                "DELETE FROM {} WHERE key IN ({})",
                quote_ident(table),
                placeholders(chunk.len())
            );
            self.log_statement(&sql, table);
            deleted += self
                .conn
                .execute(&sql, rusqlite::params_from_iter(chunk.iter()))?;
        }
        trace!(table, deleted, "Rows deleted");
        Ok(())
    }

    fn add_permission(&self, bucket: &str, key: &str, values: &[String]) -> Result<()> {
        let table = self.permissions_table();
        match self.fetch_document(bucket)? {
            None => {
                let mut doc = PermissionDocument::new();
                doc.merge(key, values);
                if doc.is_empty() {
                    return Ok(());
                }
                self.insert_row(table, bucket, &encode(&doc)?)
            }
            Some(mut doc) => {
                doc.merge(key, values);
                self.update_row(table, bucket, &encode(&doc)?)
            }
        }
    }

    fn remove_permission(&self, bucket: &str, key: &str, values: &[String]) -> Result<()> {
        let Some(mut doc) = self.fetch_document(bucket)? else {
            return Ok(());
        };
        doc.remove_values(key, values);
        self.store_document(bucket, &doc)
    }

    fn del_permission(&self, bucket: &str, keys: &[String]) -> Result<()> {
        let Some(mut doc) = self.fetch_document(bucket)? else {
            return Ok(());
        };
        doc.remove_keys(keys);
        self.store_document(bucket, &doc)
    }

    /// Persist a pruned document, deleting its row once nothing is left.
    fn store_document(&self, bucket: &str, doc: &PermissionDocument) -> Result<()> {
        let table = self.permissions_table();
        if doc.is_empty() {
            let sql = format!("DELETE FROM {} WHERE key = ?1", quote_ident(table));
            self.log_statement(&sql, table);
            self.conn.execute(&sql, [bucket])?;
            debug!(bucket, "Permission bucket emptied, row removed");
            Ok(())
        } else {
            self.update_row(table, bucket, &encode(doc)?)
        }
    }

    // ===========
    // Row access
    // ===========

    fn permissions_table(&self) -> &str {
        self.registry.table(BucketKind::Permissions)
    }

    fn fetch_raw(&self, table: &str, key: &str) -> Result<Option<String>> {
        let sql = format!("SELECT value FROM {} WHERE key = ?1", quote_ident(table));
        self.log_statement(&sql, table);
        let raw = self
            .conn
            .query_row(&sql, [key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(raw)
    }

    fn fetch_values(&self, bucket: &Bucket, key: &str) -> Result<Option<Vec<String>>> {
        self.fetch_raw(self.registry.table_for(bucket), key)?
            .map(|raw| decode_values(&raw))
            .transpose()
    }

    fn fetch_document(&self, bucket: &str) -> Result<Option<PermissionDocument>> {
        self.fetch_raw(self.permissions_table(), bucket)?
            .map(|raw| serde_json::from_str::<PermissionDocument>(&raw).map_err(Error::from))
            .transpose()
    }

    fn insert_row(&self, table: &str, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let sql = format!(
            "INSERT INTO {} (key, value, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            quote_ident(table)
        );
        self.log_statement(&sql, table);
        self.conn
            .execute(&sql, rusqlite::params![key, value, now])?;
        Ok(())
    }

    fn update_row(&self, table: &str, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let sql = format!(
            "UPDATE {} SET value = ?1, updated_at = ?2 WHERE key = ?3",
            quote_ident(table)
        );
        self.log_statement(&sql, table);
        self.conn
            .execute(&sql, rusqlite::params![value, now, key])?;
        Ok(())
    }

    fn log_statement(&self, sql: &str, table: &str) {
        if self.verbose {
            debug!(table, sql, "Executing");
        } else {
            trace!(table, sql, "Executing");
        }
    }
}

/// Keys bound per `IN (...)` list, well under SQLite's host parameter limit.
const MAX_KEYS_PER_STATEMENT: usize = 500;

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn decode_values(raw: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str(raw)?)
}
