// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end runs of the `fedlink` binary against a temp database.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let db = dir.join("fedlink.db");
    let path = dir.join("fedlink.toml");
    let content = format!(
        "[storage]\ndatabase_path = {:?}\n{extra}",
        db.to_string_lossy()
    );
    std::fs::write(&path, content).unwrap();
    path
}

fn fedlink(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fedlink"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn migrate_then_inspect_empty_database() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let out = fedlink(&config, &["migrate"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("database ready"));
    assert!(dir.path().join("fedlink.db").exists());

    let out = fedlink(&config, &["state", "5", "--json"]);
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["item"], 5);
    assert!(json["state"].is_null());

    let out = fedlink(&config, &["queue", "--contact", "1", "--json"]);
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["pending"], 0);
    assert_eq!(json["liveness"], "healthy");

    let out = fedlink(&config, &["relations", "1", "--json"]);
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["followers"], 0);
    assert!(json.get("common").is_none());

    let out = fedlink(&config, &["relations", "1", "--with", "2", "--limit", "5", "--json"]);
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["common"]["with"], 2);
    assert_eq!(json["common"]["interactions"], 0);
}

#[test]
fn configured_ceilings_reach_reports() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[delivery]\nbatch_queue_ceiling = 40\n");

    let out = fedlink(&config, &["queue", "--contact", "3", "--json"]);
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["direct_ceiling"], 500);
    assert_eq!(json["batch_ceiling"], 40);
}

#[test]
fn doctor_passes_after_migrate() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    assert!(fedlink(&config, &["migrate"]).status.success());

    let out = fedlink(&config, &["doctor", "--plain"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("[OK]   Database"));
    assert!(!stdout.contains("[FAIL]"));
}

#[test]
fn invalid_config_exits_with_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[discovery]\npolcy = \"all\"\n");

    let out = fedlink(&config, &["migrate"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("polcy"), "{stderr}");
    assert!(!dir.path().join("fedlink.db").exists());
}
