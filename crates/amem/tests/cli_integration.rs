//! CLI integration tests.
//!
//! These tests run the amem binary end to end. Each test gets its own
//! config directory and working directory so no user config leaks in.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Build an amem command isolated to `dir`.
fn amem(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("amem").unwrap();
    cmd.env("AMEM_CONFIG_DIR", dir)
        .env_remove("AMEM_CONFIG")
        .env_remove("RUST_LOG")
        .current_dir(dir);
    cmd
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("amem.toml"), "[logging]\nfile = false\n").unwrap();
    dir
}

fn write_script(dir: &Path, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.join("script.amem");
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

// ─────────────────────────────────────────────────────────────────────────────
// Basic CLI Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_commands() {
    let dir = workspace();
    amem(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("repl"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_flag() {
    let dir = workspace();
    amem(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("amem"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let dir = workspace();
    amem(dir.path())
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Run Subcommand Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_run_script_recalls_related_notes() {
    let dir = workspace();
    let script = write_script(
        dir.path(),
        &[
            "store caching improves read latency",
            "store LRU eviction for caches",
            "store cache invalidation is hard",
            "store morning greeting logic",
            "recall cache eviction strategy",
        ],
    );

    let output = amem(dir.path())
        .arg("--json")
        .arg("run")
        .arg(&script)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let last = stdout.lines().last().unwrap();
    let hits: serde_json::Value = serde_json::from_str(last).unwrap();
    let contents: Vec<&str> = hits
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["note"]["content"].as_str().unwrap())
        .collect();

    for expected in [
        "caching improves read latency",
        "LRU eviction for caches",
        "cache invalidation is hard",
    ] {
        assert!(contents.contains(&expected), "missing {expected}: {contents:?}");
    }
}

#[test]
fn test_run_skips_comments_and_blank_lines() {
    let dir = workspace();
    let script = write_script(
        dir.path(),
        &["# setup", "", "store rust ownership rules", "   # indented", "stats"],
    );

    amem(dir.path())
        .arg("--json")
        .arg("run")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_notes\":1"));
}

#[test]
fn test_run_reports_failing_line() {
    let dir = workspace();
    let script = write_script(dir.path(), &["store first note", "# comment", "frobnicate"]);

    amem(dir.path())
        .arg("run")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 3"));
}

#[test]
fn test_run_missing_script_fails() {
    let dir = workspace();
    amem(dir.path())
        .args(["run", "does-not-exist.amem"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read script"));
}

#[test]
fn test_run_stops_at_quit() {
    let dir = workspace();
    let script = write_script(dir.path(), &["store before quit", "quit", "frobnicate"]);

    amem(dir.path()).arg("run").arg(&script).assert().success();
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Subcommand Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_shows_defaults() {
    let dir = workspace();
    amem(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_notes = 1000"));
}

#[test]
fn test_config_flag_overrides_discovery() {
    let dir = workspace();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[memory]\nmax_notes = 5\n\n[logging]\nfile = false\n").unwrap();

    amem(dir.path())
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_notes = 5"))
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_json_output() {
    let dir = workspace();
    let output = amem(dir.path())
        .args(["--json", "config"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["memory"]["max_notes"], 1000);
}
