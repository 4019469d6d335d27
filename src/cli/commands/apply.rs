//! Commit a batch of operations from JSON.
//!
//! Input is a JSON array of operations:
//!
//! ```json
//! [
//!   {"op": "add", "bucket": "roles", "key": "admin", "values": ["alice"]},
//!   {"op": "remove", "bucket": "resources_allows_article", "key": "admin", "values": "delete"},
//!   {"op": "del", "bucket": "users", "keys": ["mallory"]}
//! ]
//! ```
//!
//! The whole array is validated before anything is written. On commit the
//! operations run in order and stop at the first failure; earlier
//! operations stay written.

use crate::error::{Error, Result};
use crate::cli::commands::StorageOptions;
use crate::storage::Operation;
use colored::Colorize;
use serde::Serialize;
use std::io::Read;
use std::path::Path;

#[derive(Serialize)]
struct ApplyOutput {
    units: usize,
    committed: bool,
}

/// Parse a JSON array of operations.
///
/// # Errors
///
/// Returns `InvalidArgument` naming the first malformed operation.
pub fn parse_operations(input: &str) -> Result<Vec<Operation>> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(input)?;
    raw.into_iter()
        .enumerate()
        .map(|(i, value)| {
            serde_json::from_value(value)
                .map_err(|e| Error::InvalidArgument(format!("operation {i}: {e}")))
        })
        .collect()
}

/// Execute the apply command.
///
/// # Errors
///
/// Returns a validation error before any write if the input is malformed,
/// otherwise the first storage error of the commit.
pub fn execute(opts: &StorageOptions<'_>, file: Option<&Path>, json: bool) -> Result<()> {
    let input = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let operations = parse_operations(&input)?;

    let storage = opts.open()?;
    let mut batch = storage.begin();
    for operation in operations {
        batch.push(operation)?;
    }
    let units = batch.len();

    if let Err(e) = storage.commit(&mut batch) {
        let Some(unit) = batch.failed_unit() else {
            return Err(e);
        };
        if !json {
            eprintln!(
                "{} unit {unit} of {units} failed; {unit} earlier unit(s) stay committed",
                "!".red()
            );
        }
        return Err(Error::BatchFailed {
            unit,
            units,
            source: Box::new(e),
        });
    }

    if json {
        println!(
            "{}",
            serde_json::to_string(&ApplyOutput {
                units,
                committed: true
            })?
        );
    } else if !crate::is_silent() {
        println!("{} Committed {units} operation(s)", "✓".green());
    }

    Ok(())
}
