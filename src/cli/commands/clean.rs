//! Reset command: delete every row from every bucket.

use crate::cli::commands::StorageOptions;
use crate::error::{Error, Result};

/// Execute the clean command.
///
/// # Errors
///
/// Returns `InvalidArgument` without `--yes`, or an error if a delete fails.
pub fn execute(opts: &StorageOptions<'_>, yes: bool, json: bool) -> Result<()> {
    if !yes {
        return Err(Error::InvalidArgument(
            "clean deletes every stored set; pass --yes to confirm".to_string(),
        ));
    }

    let storage = opts.open()?;
    storage.clean()?;

    if json {
        println!("{}", serde_json::json!({ "cleaned": true }));
    } else if !crate::is_silent() {
        println!("Cleaned all buckets");
    }
    Ok(())
}
