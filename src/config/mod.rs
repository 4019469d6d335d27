//! Configuration management.
//!
//! This module provides the adapter configuration (table prefix, per-bucket
//! table names, provisioning and logging switches), loading it from a JSON
//! file, and resolving the database path.
//!
//! Configuration is pure data. Building a [`BucketRegistry`] from it does no
//! I/O; tables are only created by an explicit `ensure_schema` call.
//!
//! [`BucketRegistry`]: crate::storage::BucketRegistry

use crate::error::{Error, Result};
use crate::model::BucketKind;
use crate::validate::validate_table_name;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Physical table name (before prefixing) for each bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketNames {
    pub meta: String,
    pub parents: String,
    pub permissions: String,
    pub resources: String,
    pub roles: String,
    pub users: String,
}

impl Default for BucketNames {
    fn default() -> Self {
        Self {
            meta: BucketKind::Meta.as_str().to_string(),
            parents: BucketKind::Parents.as_str().to_string(),
            permissions: BucketKind::Permissions.as_str().to_string(),
            resources: BucketKind::Resources.as_str().to_string(),
            roles: BucketKind::Roles.as_str().to_string(),
            users: BucketKind::Users.as_str().to_string(),
        }
    }
}

impl BucketNames {
    /// Table name configured for `kind`.
    #[must_use]
    pub fn get(&self, kind: BucketKind) -> &str {
        match kind {
            BucketKind::Meta => &self.meta,
            BucketKind::Parents => &self.parents,
            BucketKind::Permissions => &self.permissions,
            BucketKind::Resources => &self.resources,
            BucketKind::Roles => &self.roles,
            BucketKind::Users => &self.users,
        }
    }

    /// Replace the table name for `kind`.
    pub fn set(&mut self, kind: BucketKind, name: impl Into<String>) {
        let slot = match kind {
            BucketKind::Meta => &mut self.meta,
            BucketKind::Parents => &mut self.parents,
            BucketKind::Permissions => &mut self.permissions,
            BucketKind::Resources => &mut self.resources,
            BucketKind::Roles => &mut self.roles,
            BucketKind::Users => &mut self.users,
        };
        *slot = name.into();
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with_override(mut self, kind: BucketKind, name: impl Into<String>) -> Self {
        self.set(kind, name);
        self
    }

    /// Apply a `bucket=table` override, as given on the command line.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the pair has no `=`, or `InvalidBucket`
    /// if the bucket is unknown.
    pub fn apply_override(&mut self, pair: &str) -> Result<()> {
        let (bucket, table) = pair.split_once('=').ok_or_else(|| {
            Error::InvalidArgument(format!("override '{pair}' must look like bucket=table"))
        })?;
        let kind: BucketKind = bucket.trim().parse()?;
        self.set(kind, table.trim());
        Ok(())
    }
}

/// Adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Prepended to every table name.
    pub table_prefix: String,
    /// Per-bucket table names.
    pub buckets: BucketNames,
    /// Create missing tables when opening through the convenience constructors.
    pub auto_provision: bool,
    /// Log every storage statement at debug level instead of trace.
    pub verbose: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            table_prefix: String::new(),
            buckets: BucketNames::default(),
            auto_provision: true,
            verbose: false,
        }
    }
}

impl AdapterConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, or `Config` if it does not
    /// parse or names an invalid table.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise return defaults.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_buckets(mut self, buckets: BucketNames) -> Self {
        self.buckets = buckets;
        self
    }

    #[must_use]
    pub fn with_auto_provision(mut self, auto_provision: bool) -> Self {
        self.auto_provision = auto_provision;
        self
    }

    /// Check that every resulting table name is usable and that no two
    /// buckets resolve to the same table.
    ///
    /// # Errors
    ///
    /// Returns `Config` for empty or non-identifier table names, or for a
    /// table claimed by more than one bucket.
    pub fn validate(&self) -> Result<()> {
        // SQLite identifiers are case-insensitive.
        let mut claimed: HashMap<String, BucketKind> = HashMap::new();
        for kind in BucketKind::ALL {
            let table = format!("{}{}", self.table_prefix, self.buckets.get(kind));
            validate_table_name(&table)?;
            if let Some(owner) = claimed.insert(table.to_ascii_lowercase(), kind) {
                return Err(Error::Config(format!(
                    "buckets '{owner}' and '{kind}' both resolve to table '{table}'"
                )));
            }
        }
        Ok(())
    }
}

/// Get the global aclstore directory location (`~/.aclstore/`).
#[must_use]
pub fn global_aclstore_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".aclstore"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `ACLSTORE_DB` environment variable
/// 3. Global location: `~/.aclstore/data/aclstore.db`
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(db_path) = std::env::var("ACLSTORE_DB") {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    global_aclstore_dir().map(|dir| dir.join("data").join("aclstore.db"))
}

/// Resolve the configuration file path: explicit flag, then `ACLSTORE_CONFIG`.
#[must_use]
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    std::env::var("ACLSTORE_CONFIG")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
}
