//! Read commands: `get` and `union`.

use crate::cli::commands::StorageOptions;
use crate::error::Result;
use crate::model::Bucket;
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct ValuesOutput<'a> {
    bucket: &'a str,
    keys: &'a [String],
    values: &'a [String],
    count: usize,
}

/// Execute the get command.
///
/// # Errors
///
/// Returns an error if the bucket is unknown or the read fails.
pub fn get(opts: &StorageOptions<'_>, bucket: &str, key: &str, json: bool) -> Result<()> {
    let bucket = Bucket::parse(bucket)?;
    let storage = opts.open()?;
    let values = storage.get(&bucket, key)?;
    print_values(&bucket, &[key.to_string()], &values, json)
}

/// Execute the union command.
///
/// # Errors
///
/// Returns an error if the bucket is unknown or the read fails.
pub fn union(opts: &StorageOptions<'_>, bucket: &str, keys: &[String], json: bool) -> Result<()> {
    let bucket = Bucket::parse(bucket)?;
    let storage = opts.open()?;
    let values = storage.union(&bucket, keys)?;
    print_values(&bucket, keys, &values, json)
}

fn print_values(bucket: &Bucket, keys: &[String], values: &[String], json: bool) -> Result<()> {
    if json {
        let output = ValuesOutput {
            bucket: bucket.name(),
            keys,
            values,
            count: values.len(),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if crate::is_silent() {
        for value in values {
            println!("{value}");
        }
        return Ok(());
    }

    let label = format!("{bucket}[{}]", keys.join(", "));
    if values.is_empty() {
        println!("{} {}", label.bold(), "(empty)".dimmed());
    } else {
        println!("{} ({} values)", label.bold(), values.len());
        for value in values {
            println!("  {value}");
        }
    }
    Ok(())
}
