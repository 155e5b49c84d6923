//! CLI argument surface and offline behavior.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn hostsync() -> Command {
    Command::cargo_bin("hostsync").expect("hostsync binary")
}

#[test]
fn help_lists_subcommands() {
    hostsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("refresh"))
        .stdout(predicate::str::contains("diff"))
        .stdout(predicate::str::contains("stop"));
}

#[test]
fn version_flag_works() {
    hostsync()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hostsync"));
}

#[test]
fn run_rejects_zero_interval() {
    hostsync()
        .args(["run", "--interval", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval"));
}

#[test]
fn status_without_daemon_reports_not_running() {
    let dir = TempDir::new().unwrap();
    let socket = dir.path().join("absent.sock");
    hostsync()
        .args(["status", "--socket"])
        .arg(&socket)
        .assert()
        .success()
        .stdout(predicate::str::contains("daemon is not running"));
}

#[test]
fn status_json_without_daemon_reports_running_false() {
    let dir = TempDir::new().unwrap();
    let socket = dir.path().join("absent.sock");
    let output = hostsync()
        .args(["status", "--json", "--socket"])
        .arg(&socket)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(payload["running"], serde_json::json!(false));
}

#[test]
fn stop_without_daemon_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let socket = dir.path().join("absent.sock");
    hostsync()
        .args(["stop", "--socket"])
        .arg(&socket)
        .assert()
        .success()
        .stdout(predicate::str::contains("daemon is not running"));
}

#[test]
fn refresh_without_daemon_fails() {
    let dir = TempDir::new().unwrap();
    let socket = dir.path().join("absent.sock");
    hostsync()
        .args(["refresh", "--socket"])
        .arg(&socket)
        .assert()
        .failure()
        .stderr(predicate::str::contains("daemon is not running"));
}
