//! Initialize an aclstore database.
//!
//! Creates the database file (and its parent directories) and provisions
//! the six bucket tables. Provisioning is idempotent, so `--force` on an
//! existing database only re-runs it.

use crate::cli::commands::StorageOptions;
use crate::error::{Error, Result};
use crate::storage::SqliteBackend;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    tables: Vec<String>,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if the database exists and `force` is not
/// set, or an error if the file or tables cannot be created.
pub fn execute(opts: &StorageOptions<'_>, force: bool, json: bool) -> Result<()> {
    let db_path = opts.db_path()?;
    if db_path.exists() && !force {
        return Err(Error::AlreadyInitialized { path: db_path });
    }

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let config = opts.load_config()?;
    let storage = SqliteBackend::open(&db_path, &config.with_auto_provision(false))?;
    storage.ensure_schema()?;

    let tables: Vec<String> = storage
        .registry()
        .iter()
        .map(|(_, table)| table.to_string())
        .collect();

    if json {
        let output = InitOutput {
            database: db_path,
            tables,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if !crate::is_silent() {
        println!("Initialized aclstore database");
        println!("  Database: {}", db_path.display());
        println!("  Tables:   {}", tables.join(", "));
    }

    Ok(())
}
