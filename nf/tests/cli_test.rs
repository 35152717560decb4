//! End-to-end tests for the nf binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// nf with data, config and working directories isolated under `dir`
fn nf(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("nf").expect("nf binary should build");
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_DATA_HOME", dir.join("data"))
        .env("XDG_CONFIG_HOME", dir.join("config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn write_scenario(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write scenario");
    path
}

const PASSING: &str = r#"
name: pass
description: push twice and swipe back
steps:
  - op: push
    screen: A
  - op: push
    screen: B
  - op: swipe-back
  - op: expect
    stack: [A]
    host-stack: [A]
"#;

const FAILING: &str = r#"
name: fail
steps:
  - op: push
    screen: A
  - op: expect
    stack: [B]
"#;

#[test]
fn test_version_flag() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    nf(temp.path()).arg("--version").assert().success().stdout(predicate::str::starts_with("nf "));
}

#[test]
fn test_demo_lists_embedded_scenarios() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    nf(temp.path())
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Available demos:"))
        .stdout(predicate::str::contains("swipe-back"))
        .stdout(predicate::str::contains("modal-flow"))
        .stdout(predicate::str::contains("nested-flows"));
}

#[test]
fn test_demo_runs_and_passes() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    for name in ["swipe-back", "modal-flow", "nested-flows"] {
        nf(temp.path())
            .args(["demo", name])
            .assert()
            .success()
            .stdout(predicate::str::contains("PASSED"));
    }
}

#[test]
fn test_unknown_demo_fails() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    nf(temp.path())
        .args(["demo", "tab-bar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown demo: tab-bar"));
}

#[test]
fn test_check_valid_scenario() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = write_scenario(temp.path(), "pass.yml", PASSING);
    nf(temp.path())
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("pass (4 steps)"));
}

#[test]
fn test_check_rejects_invalid_scenario() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = write_scenario(
        temp.path(),
        "bad.yml",
        "name: bad\nsteps:\n  - op: pop-to\n    kind: \"\"\n",
    );
    nf(temp.path()).arg("check").arg(&path).assert().failure();
}

#[test]
fn test_check_missing_file_fails() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    nf(temp.path())
        .args(["check", "does-not-exist.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.yml"));
}

#[test]
fn test_run_passing_scenario() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = write_scenario(temp.path(), "pass.yml", PASSING);
    nf(temp.path())
        .arg("run")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Scenario: pass"))
        .stdout(predicate::str::contains("PASSED"));
}

#[test]
fn test_run_failing_expectation_exits_non_zero() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = write_scenario(temp.path(), "fail.yml", FAILING);
    nf(temp.path())
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAILED"))
        .stderr(predicate::str::contains("expectations failed"));
}

#[test]
fn test_run_json_output() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = write_scenario(temp.path(), "pass.yml", PASSING);
    let output = nf(temp.path())
        .args(["run", "--format", "json"])
        .arg(&path)
        .output()
        .expect("Failed to run nf");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["scenario"], "pass");
    assert!(report["failures"].as_array().is_some_and(|f| f.is_empty()));
}

#[test]
fn test_config_file_is_honored() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = write_scenario(temp.path(), "nf.yml", "log-level: debug\nsimulator:\n  stop-on-failure: true\n");
    let path = write_scenario(temp.path(), "fail.yml", FAILING);
    nf(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg(&path)
        .assert()
        .failure();
    assert!(temp.path().join("data/navflow/logs/navflow.log").exists());
}
