//! Set storage behavior against an on-disk database.

use aclstore::config::{AdapterConfig, BucketNames};
use aclstore::model::{Bucket, BucketKind, PlainKind};
use aclstore::storage::{BatchState, SqliteBackend};
use aclstore::Error;
use tempfile::TempDir;

fn sorted(mut values: Vec<String>) -> Vec<String> {
    values.sort();
    values
}

fn open(dir: &TempDir, config: &AdapterConfig) -> SqliteBackend {
    SqliteBackend::open(&dir.path().join("acl.db"), config).unwrap()
}

#[test]
fn test_set_semantics_for_every_plain_bucket() {
    let dir = TempDir::new().unwrap();
    let storage = open(&dir, &AdapterConfig::default());

    for kind in PlainKind::ALL {
        let bucket = Bucket::from(kind);
        let mut batch = storage.begin();
        storage.add(&mut batch, &bucket, "k", ["v1", "v2"]).unwrap();
        storage.add(&mut batch, &bucket, "k", ["v2", "v3"]).unwrap();
        storage.commit(&mut batch).unwrap();

        assert_eq!(sorted(storage.get(&bucket, "k").unwrap()), ["v1", "v2", "v3"]);
        assert!(storage.get(&bucket, "never-written").unwrap().is_empty());

        let mut batch = storage.begin();
        storage.remove(&mut batch, &bucket, "k", ["v1", "v3"]).unwrap();
        storage.commit(&mut batch).unwrap();
        assert_eq!(storage.get(&bucket, "k").unwrap(), ["v2"]);

        let mut batch = storage.begin();
        storage.del(&mut batch, &bucket, "k").unwrap();
        storage.commit(&mut batch).unwrap();
        assert!(storage.get(&bucket, "k").unwrap().is_empty());
    }
}

#[test]
fn test_data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let config = AdapterConfig::default().with_prefix("acl_");
    let perms = Bucket::parse("resources_allows_article").unwrap();
    let parents = Bucket::parse("parents").unwrap();

    {
        let storage = open(&dir, &config);
        let mut batch = storage.begin();
        storage.add(&mut batch, &perms, "admin", ["read", "write"]).unwrap();
        storage.add(&mut batch, &parents, "editor", "author").unwrap();
        storage.commit(&mut batch).unwrap();
    }

    let storage = open(&dir, &config);
    assert_eq!(sorted(storage.get(&perms, "admin").unwrap()), ["read", "write"]);
    assert_eq!(storage.get(&parents, "editor").unwrap(), ["author"]);
}

#[test]
fn test_overridden_table_names() {
    let dir = TempDir::new().unwrap();
    let config = AdapterConfig::default()
        .with_buckets(BucketNames::default().with_override(BucketKind::Roles, "acl_roles"));
    let storage = open(&dir, &config);
    let roles = Bucket::parse("roles").unwrap();

    let mut batch = storage.begin();
    storage.add(&mut batch, &roles, "admin", "alice").unwrap();
    storage.commit(&mut batch).unwrap();

    let count: i64 = storage
        .conn()
        .query_row("SELECT COUNT(*) FROM acl_roles", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_no_auto_provision_leaves_database_empty() {
    let dir = TempDir::new().unwrap();
    let storage = open(&dir, &AdapterConfig::default().with_auto_provision(false));

    let tables: i64 = storage
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tables, 0);

    storage.ensure_schema().unwrap();
    storage.ensure_schema().unwrap();
    assert!(storage.get(&Bucket::parse("users").unwrap(), "x").unwrap().is_empty());
}

#[test]
fn test_failed_unit_leaves_earlier_units_committed() {
    let dir = TempDir::new().unwrap();
    let storage = open(&dir, &AdapterConfig::default());
    let users = Bucket::parse("users").unwrap();
    let perms = Bucket::parse("resources_allows_article").unwrap();
    let meta = Bucket::parse("meta").unwrap();

    let mut batch = storage.begin();
    storage.add(&mut batch, &users, "alice", "admin").unwrap();
    storage.add(&mut batch, &perms, "admin", "read").unwrap();
    storage.add(&mut batch, &meta, "users", "alice").unwrap();

    storage.conn().execute("DROP TABLE permissions", []).unwrap();

    let err = storage.commit(&mut batch).unwrap_err();
    assert!(matches!(err, Error::Database(_)));
    assert_eq!(batch.state(), BatchState::Failed { unit: 1 });
    assert_eq!(storage.get(&users, "alice").unwrap(), ["admin"]);
    assert!(storage.get(&meta, "users").unwrap().is_empty());
}

#[test]
fn test_invalid_config_rejected_before_open() {
    let dir = TempDir::new().unwrap();
    let config = AdapterConfig::default()
        .with_buckets(BucketNames::default().with_override(BucketKind::Users, ""));
    let result = SqliteBackend::open(&dir.path().join("acl.db"), &config);
    assert!(matches!(result, Err(Error::Config(_))));
    assert!(!dir.path().join("acl.db").exists());
}
