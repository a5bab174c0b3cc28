//! Smoke tests for the ledgerprobe CLI

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn ledgerprobe() -> Command {
    let mut cmd = Command::cargo_bin("ledgerprobe").expect("ledgerprobe binary should exist");
    cmd.env_remove("RUST_LOG").env_remove("LEDGERPROBE_CONFIG");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    ledgerprobe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.3.0"));
}

#[test]
fn test_help_flag() {
    ledgerprobe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_fails() {
    ledgerprobe().assert().failure();
}

#[test]
fn test_list_shows_catalogue() {
    ledgerprobe()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("valid-customer"))
        .stdout(predicate::str::contains("session-termination"))
        .stdout(predicate::str::contains("filter-reset"));
}

#[test]
fn test_unknown_scenario_rejected() {
    ledgerprobe()
        .args(["run", "transfer-funds", "--backend", "mock"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

// ============================================================================
// Mock Backend Runs
// ============================================================================

#[test]
fn test_run_valid_customer_on_mock() {
    ledgerprobe()
        .args(["run", "valid-customer", "--backend", "mock"])
        .assert()
        .success()
        .stderr(predicate::str::contains("PASSED"));
}

#[test]
fn test_deployed_defect_sets_exit_code() {
    ledgerprobe()
        .args(["run", "numeric-name", "--backend", "mock", "--deployed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 1 scenarios failed"));
}

#[test]
fn test_json_report() {
    let dir = TempDir::new().unwrap();
    let report = dir.path().join("report.json");

    ledgerprobe()
        .args(["run", "deposit", "filter-reset", "--backend", "mock", "--json"])
        .arg(&report)
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["reports"].as_array().unwrap().len(), 2);
    assert_eq!(json["reports"][0]["scenario"], "deposit");
    assert_eq!(json["reports"][0]["passed"], true);
}

#[test]
fn test_artifacts_written() {
    let dir = TempDir::new().unwrap();

    ledgerprobe()
        .args(["run", "open-account", "--backend", "mock", "--artifacts"])
        .arg(dir.path())
        .assert()
        .success();

    let session_dir = fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap().path();
    let shots: Vec<_> = fs::read_dir(session_dir).unwrap().collect();
    assert!(!shots.is_empty());
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_config_show_defaults() {
    ledgerprobe()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dialog_timeout_ms: 5000"))
        .stdout(predicate::str::contains("BankingProject"));
}

#[test]
fn test_config_init_then_use() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledgerprobe.yaml");

    ledgerprobe()
        .args(["config", "init"])
        .arg(&path)
        .assert()
        .success();
    assert!(path.exists());

    ledgerprobe()
        .args(["config", "init"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    ledgerprobe()
        .arg("--config")
        .arg(&path)
        .args(["run", "customer-login", "--backend", "mock"])
        .assert()
        .success();
}

#[test]
fn test_bad_config_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "verification_attempts: 0\n").unwrap();

    ledgerprobe()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}
