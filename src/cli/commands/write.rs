//! Single-operation write commands: `add`, `remove`, `del`.
//!
//! Each command stages one operation in a fresh batch and commits it.

use crate::cli::SetArgs;
use crate::cli::commands::StorageOptions;
use crate::error::Result;
use crate::model::{Bucket, Values};
use serde::Serialize;

#[derive(Serialize)]
struct WriteOutput<'a> {
    op: &'a str,
    bucket: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<&'a str>,
    values: &'a [String],
    committed: bool,
}

/// Execute the add command.
///
/// # Errors
///
/// Returns an error if the bucket is unknown or the commit fails.
pub fn add(opts: &StorageOptions<'_>, args: &SetArgs, json: bool) -> Result<()> {
    let bucket = Bucket::parse(&args.bucket)?;
    let storage = opts.open()?;

    let mut batch = storage.begin();
    storage.add(&mut batch, &bucket, &args.key, args.values.as_slice())?;
    storage.commit(&mut batch)?;

    report("add", &bucket, Some(&args.key), &args.values, json)
}

/// Execute the remove command.
///
/// # Errors
///
/// Returns an error if the bucket is unknown or the commit fails.
pub fn remove(opts: &StorageOptions<'_>, args: &SetArgs, json: bool) -> Result<()> {
    let bucket = Bucket::parse(&args.bucket)?;
    let storage = opts.open()?;

    let mut batch = storage.begin();
    storage.remove(&mut batch, &bucket, &args.key, args.values.as_slice())?;
    storage.commit(&mut batch)?;

    report("remove", &bucket, Some(&args.key), &args.values, json)
}

/// Execute the del command.
///
/// # Errors
///
/// Returns an error if the bucket is unknown or the commit fails.
pub fn del(opts: &StorageOptions<'_>, bucket: &str, keys: &[String], json: bool) -> Result<()> {
    let bucket = Bucket::parse(bucket)?;
    let storage = opts.open()?;

    let mut batch = storage.begin();
    storage.del(&mut batch, &bucket, Values::from(keys))?;
    storage.commit(&mut batch)?;

    report("del", &bucket, None, keys, json)
}

fn report(op: &str, bucket: &Bucket, key: Option<&str>, values: &[String], json: bool) -> Result<()> {
    if json {
        let output = WriteOutput {
            op,
            bucket: bucket.name(),
            key,
            values,
            committed: true,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if !crate::is_silent() {
        match key {
            Some(key) => println!("{op} {bucket}[{key}]: {}", values.join(", ")),
            None => println!("{op} {bucket}: {}", values.join(", ")),
        }
    }
    Ok(())
}
