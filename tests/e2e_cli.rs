//! CLI end-to-end tests
//!
//! Tests for the hlsforged command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the hlsforged binary
#[allow(deprecated)]
fn hlsforged_cmd() -> Command {
    Command::cargo_bin("hlsforged").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = hlsforged_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = hlsforged_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("hlsforged"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = hlsforged_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hlsforged"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = hlsforged_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_check_tools_command() {
    let mut cmd = hlsforged_cmd();
    cmd.arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("ffprobe"));
}

#[test]
fn test_cli_start_help() {
    let mut cmd = hlsforged_cmd();
    cmd.args(["start", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Start the HTTP server"))
        .stdout(predicate::str::contains("--port"));
}

#[test]
fn test_cli_validate_defaults() {
    let mut cmd = hlsforged_cmd();
    cmd.arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"))
        .stdout(predicate::str::contains("Max concurrent jobs: 4"));
}

#[test]
fn test_cli_validate_valid_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[server]
port = 9090

[jobs]
expiration_secs = 600
"#,
    )
    .unwrap();

    let mut cmd = hlsforged_cmd();
    cmd.arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("9090"))
        .stdout(predicate::str::contains("Expiration: 600s"));
}

#[test]
fn test_cli_validate_global_config_flag() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[server]\nport = 9191\n").unwrap();

    let mut cmd = hlsforged_cmd();
    cmd.arg("--config")
        .arg(&path)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("9191"));
}

#[test]
fn test_cli_validate_rejects_invalid_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[jobs]\nexpiration_secs = 0\n").unwrap();

    let mut cmd = hlsforged_cmd();
    cmd.arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expiration_secs"));
}

#[test]
fn test_cli_validate_missing_file() {
    let mut cmd = hlsforged_cmd();
    cmd.args(["validate", "/nonexistent/path/config.toml"])
        .assert()
        .failure();
}

#[test]
fn test_cli_unknown_subcommand() {
    let mut cmd = hlsforged_cmd();
    cmd.arg("frobnicate").assert().failure();
}
