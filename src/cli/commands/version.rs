//! `aclstore version`.

use crate::error::Result;
use crate::model::BucketKind;
use serde::Serialize;

#[derive(Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
    sqlite: &'static str,
    buckets: Vec<&'static str>,
}

impl VersionInfo {
    fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            sqlite: rusqlite::version(),
            buckets: BucketKind::ALL.iter().map(|kind| kind.as_str()).collect(),
        }
    }
}

/// Print the crate version, the linked SQLite version and the bucket set.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let info = VersionInfo::current();

    if json {
        println!("{}", serde_json::to_string(&info)?);
    } else {
        println!("{} {} (sqlite {})", info.name, info.version, info.sqlite);
        println!("buckets: {}", info.buckets.join(", "));
    }
    Ok(())
}
