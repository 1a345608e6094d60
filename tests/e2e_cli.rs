//! CLI end-to-end tests
//!
//! Tests for the persona command-line interface.

mod common;

use assert_cmd::prelude::*;
use common::TestHarness;
use predicates::prelude::*;
use std::process::Command;

/// Get a command for the persona binary
#[allow(deprecated)]
fn persona_cmd() -> Command {
    Command::cargo_bin("persona").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = persona_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = persona_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("persona"))
        .stdout(predicate::str::contains("install"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = persona_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("persona"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = persona_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_validate_config() {
    let harness = TestHarness::new();
    let mut cmd = persona_cmd();
    cmd.arg("validate")
        .arg(harness.config_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("keep 3"));
}

#[test]
fn test_cli_validate_rejects_bad_config() {
    let harness = TestHarness::with_config_toml(
        r#"
[features]
lease_secs = 0
"#,
    );
    let mut cmd = persona_cmd();
    cmd.arg("validate")
        .arg(harness.config_path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("lease_secs"));
}

#[test]
fn test_cli_install_then_status() {
    let harness = TestHarness::new();
    harness.write_startup_fixtures();

    persona_cmd()
        .arg("--config")
        .arg(harness.config_path())
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("2021-02-23 Roles: installed"));

    persona_cmd()
        .arg("--config")
        .arg(harness.config_path())
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("2021-02-23 Roles: already installed"));

    persona_cmd()
        .arg("--config")
        .arg(harness.config_path())
        .args(["status", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"2021-02-23 Auth Groups\""))
        .stdout(predicate::str::contains("\"success\": true"))
        .stdout(predicate::str::contains("Kevin Koster"));
}

#[test]
fn test_cli_install_fails_without_fixtures() {
    let harness = TestHarness::new();

    persona_cmd()
        .arg("--config")
        .arg(harness.config_path())
        .arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs a fixture file"));

    persona_cmd()
        .arg("--config")
        .arg(harness.config_path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("failed"))
        .stdout(predicate::str::contains("2021-02-23 Auth Groups"));
}

#[test]
fn test_cli_status_empty_registry() {
    let harness = TestHarness::new();

    persona_cmd()
        .arg("--config")
        .arg(harness.config_path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No features recorded."));
}

#[test]
fn test_cli_backup_writes_snapshot() {
    let harness = TestHarness::new();

    persona_cmd()
        .arg("--config")
        .arg(harness.config_path())
        .arg("backup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup written to"));

    assert!(harness.backup_dir().is_dir());
}

#[test]
fn test_cli_status_single_feature() {
    let harness = TestHarness::new();
    harness.write_startup_fixtures();

    persona_cmd()
        .arg("--config")
        .arg(harness.config_path())
        .arg("install")
        .assert()
        .success();

    persona_cmd()
        .arg("--config")
        .arg(harness.config_path())
        .args(["status", "2021-02-23 Roles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("installed"))
        .stdout(predicate::str::contains("2021-02-23 Roles"))
        .stdout(predicate::str::contains("Auth Groups").not());
}

#[test]
fn test_cli_status_unknown_feature_fails() {
    let harness = TestHarness::new();

    persona_cmd()
        .arg("--config")
        .arg(harness.config_path())
        .args(["status", "No such feature"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("feature not found: No such feature"));
}
