//! Command implementations.

pub mod apply;
pub mod clean;
pub mod completions;
pub mod init;
pub mod migrate;
pub mod query;
pub mod version;
pub mod write;

use crate::config::{AdapterConfig, resolve_config_path, resolve_db_path};
use crate::error::{Error, Result};
use crate::storage::SqliteBackend;
use std::path::PathBuf;

/// Global options every storage command needs.
#[derive(Debug, Clone, Copy)]
pub struct StorageOptions<'a> {
    pub db: Option<&'a PathBuf>,
    pub config: Option<&'a PathBuf>,
    pub prefix: Option<&'a str>,
    pub verbose: bool,
}

impl StorageOptions<'_> {
    /// Load the adapter configuration, applying command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or is invalid.
    pub fn load_config(&self) -> Result<AdapterConfig> {
        let path = resolve_config_path(self.config.map(PathBuf::as_path));
        let mut config = AdapterConfig::load_or_default(path.as_deref())?;
        if let Some(prefix) = self.prefix {
            config.table_prefix = prefix.to_string();
        }
        config.verbose |= self.verbose;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the database path without requiring it to exist.
    ///
    /// # Errors
    ///
    /// Returns `Config` if no location can be determined.
    pub fn db_path(&self) -> Result<PathBuf> {
        resolve_db_path(self.db.map(PathBuf::as_path)).ok_or_else(|| {
            Error::Config("Could not determine the database location".to_string())
        })
    }

    /// Open an existing database.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if the database file does not exist.
    pub fn open(&self) -> Result<SqliteBackend> {
        let db_path = self.db_path()?;
        if !db_path.exists() {
            return Err(Error::NotInitialized);
        }
        SqliteBackend::open(&db_path, &self.load_config()?)
    }
}
