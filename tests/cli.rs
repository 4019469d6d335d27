//! End-to-end tests for the `aclstore` binary.

use assert_cmd::Command;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn aclstore(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("aclstore").unwrap();
    cmd.arg("--db").arg(db).arg("--json");
    cmd.env_remove("ACLSTORE_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

/// The structured error is the last line of stderr; log lines may precede it.
fn json_error(stderr: &[u8]) -> Value {
    let text = String::from_utf8_lossy(stderr);
    let line = text.lines().rev().find(|l| !l.trim().is_empty()).unwrap();
    serde_json::from_str(line).unwrap()
}

fn sorted_values(output: &Value) -> Vec<String> {
    let mut values: Vec<String> = output["values"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    values.sort();
    values
}

#[test]
fn test_requires_init() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("acl.db");

    aclstore(&db)
        .args(["get", "roles", "admin"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_add_get_union_del() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("acl.db");

    aclstore(&db).arg("init").assert().success();
    aclstore(&db)
        .args(["add", "roles", "k1", "a", "b"])
        .assert()
        .success();
    aclstore(&db)
        .args(["add", "roles", "k2", "b", "c"])
        .assert()
        .success();

    let out = json_stdout(aclstore(&db).args(["union", "roles", "k1", "k2"]));
    assert_eq!(sorted_values(&out), ["a", "b", "c"]);

    aclstore(&db).args(["del", "roles", "k1"]).assert().success();
    let out = json_stdout(aclstore(&db).args(["get", "roles", "k1"]));
    assert_eq!(out["count"], 0);
}

#[test]
fn test_permission_bucket_roundtrip() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("acl.db");

    aclstore(&db).arg("init").assert().success();
    aclstore(&db)
        .args(["add", "resource_allows_x", "admin", "read", "write"])
        .assert()
        .success();
    aclstore(&db)
        .args(["add", "resource_allows_x", "admin", "write", "delete"])
        .assert()
        .success();

    let out = json_stdout(aclstore(&db).args(["get", "resource_allows_x", "admin"]));
    assert_eq!(sorted_values(&out), ["delete", "read", "write"]);

    aclstore(&db)
        .args(["remove", "resource_allows_x", "admin", "read", "write", "delete"])
        .assert()
        .success();
    let out = json_stdout(aclstore(&db).args(["get", "resource_allows_x", "admin"]));
    assert_eq!(out["count"], 0);
}

#[test]
fn test_unknown_bucket_is_validation_error() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("acl.db");

    aclstore(&db).arg("init").assert().success();
    let output = aclstore(&db)
        .args(["add", "widgets", "k", "v"])
        .assert()
        .failure()
        .code(4)
        .get_output()
        .stderr
        .clone();
    let err: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(err["error"]["code"], "INVALID_BUCKET");
}

#[test]
fn test_apply_batch_file() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("acl.db");
    let batch = dir.path().join("batch.json");
    std::fs::write(
        &batch,
        r#"[
            {"op": "add", "bucket": "users", "key": "alice", "values": ["admin", "editor"]},
            {"op": "remove", "bucket": "users", "key": "alice", "values": "editor"},
            {"op": "add", "bucket": "resources_allows_article", "key": "admin", "values": "read"}
        ]"#,
    )
    .unwrap();

    aclstore(&db).arg("init").assert().success();
    let out = json_stdout(aclstore(&db).arg("apply").arg(&batch));
    assert_eq!(out["units"], 3);

    let out = json_stdout(aclstore(&db).args(["get", "users", "alice"]));
    assert_eq!(sorted_values(&out), ["admin"]);
    let out = json_stdout(aclstore(&db).args(["get", "resources_allows_article", "admin"]));
    assert_eq!(sorted_values(&out), ["read"]);
}

#[test]
fn test_apply_rejects_malformed_batch_before_writing() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("acl.db");

    aclstore(&db).arg("init").assert().success();
    aclstore(&db)
        .arg("apply")
        .write_stdin(
            r#"[
                {"op": "add", "bucket": "users", "key": "alice", "values": "admin"},
                {"op": "add", "bucket": "users", "key": "bob", "values": {"nested": true}}
            ]"#,
        )
        .assert()
        .failure()
        .code(4);

    let out = json_stdout(aclstore(&db).args(["get", "users", "alice"]));
    assert_eq!(out["count"], 0);
}

#[test]
fn test_migrate_prints_tables_in_order() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("acl.db");

    let out = json_stdout(aclstore(&db).args([
        "migrate",
        "up",
        "--dialect",
        "postgres",
        "--override",
        "roles=roles_x",
    ]));
    assert_eq!(
        out["tables"],
        serde_json::json!(["meta", "parents", "permissions", "resources", "roles_x", "users"])
    );
    assert_eq!(out["executed"], false);
    assert!(!db.exists());

    let out = json_stdout(aclstore(&db).args(["migrate", "down"]));
    assert_eq!(
        out["tables"],
        serde_json::json!(["meta", "parents", "permissions", "resources", "roles", "users"])
    );
}

#[test]
fn test_clean_requires_confirmation() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("acl.db");

    aclstore(&db).arg("init").assert().success();
    aclstore(&db)
        .args(["add", "users", "alice", "admin"])
        .assert()
        .success();

    aclstore(&db).arg("clean").assert().failure().code(4);
    aclstore(&db).args(["clean", "--yes"]).assert().success();

    let out = json_stdout(aclstore(&db).args(["get", "users", "alice"]));
    assert_eq!(out["count"], 0);
}

#[test]
fn test_migrate_rejects_override_onto_another_bucket() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("acl.db");

    let output = aclstore(&db)
        .args(["migrate", "up", "--override", "users=permissions"])
        .assert()
        .failure()
        .code(7)
        .get_output()
        .stderr
        .clone();
    let err: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(err["error"]["code"], "CONFIG_ERROR");
}

#[test]
fn test_apply_reports_failed_unit() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("acl.db");

    let config = dir.path().join("aclstore.json");
    std::fs::write(&config, r#"{"auto_provision": false}"#).unwrap();

    aclstore(&db).arg("init").assert().success();
    rusqlite::Connection::open(&db)
        .unwrap()
        .execute("DROP TABLE roles", [])
        .unwrap();

    let output = aclstore(&db)
        .arg("--config")
        .arg(&config)
        .arg("apply")
        .write_stdin(
            r#"[
                {"op": "add", "bucket": "users", "key": "alice", "values": "admin"},
                {"op": "add", "bucket": "roles", "key": "admin", "values": "alice"},
                {"op": "add", "bucket": "users", "key": "bob", "values": "guest"}
            ]"#,
        )
        .assert()
        .failure()
        .code(2)
        .get_output()
        .stderr
        .clone();
    let err = json_error(&output);
    assert_eq!(err["error"]["code"], "DATABASE_ERROR");
    assert_eq!(err["error"]["failed_unit"], 1);
    assert_eq!(err["error"]["executed"], 1);
    assert_eq!(err["error"]["units"], 3);

    let out = json_stdout(aclstore(&db).args(["get", "users", "alice"]));
    assert_eq!(sorted_values(&out), ["admin"]);
    let out = json_stdout(aclstore(&db).args(["get", "users", "bob"]));
    assert_eq!(out["count"], 0);
}
