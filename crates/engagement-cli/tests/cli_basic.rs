//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a temporary data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_engagement-cli"))
        .env("ENGAGEMENT_DATA_DIR", data_dir)
        .env_remove("ENGAGEMENT_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout is JSON")
}

#[test]
fn test_status_creates_full_profile() {
    let dir = tempfile::tempdir().unwrap();
    let status = run_json(dir.path(), &["status"]);
    assert_eq!(status["lives"], 5);
    assert_eq!(status["pool_status"], "full");
    assert_eq!(status["streak"], 0);
    assert_eq!(status["timezone"], "+05:30");
    assert!(dir.path().join("engagement.db").exists());
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_spend_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let spent = run_json(dir.path(), &["lives", "spend", "2"]);
    assert_eq!(spent["kind"], "lives_spent");
    assert_eq!(spent["remaining"], 3);

    let status = run_json(dir.path(), &["status"]);
    assert_eq!(status["lives"], 3);
    assert_eq!(status["pool_status"], "regenerating");
}

#[test]
fn test_spend_beyond_pool_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["lives", "spend", "9"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: Not enough lives"), "{stderr}");
}

#[test]
fn test_activity_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let recorded = run_json(dir.path(), &["streak", "activity"]);
    assert_eq!(recorded["outcome"], "first");
    assert_eq!(recorded["streak"], 1);

    let shown = run_json(dir.path(), &["streak", "show"]);
    assert_eq!(shown["streak"], 1);
    assert_eq!(shown["status"], "active");
}

#[test]
fn test_separate_users_do_not_share_profiles() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["lives", "spend", "--user", "alice"]);
    let bob = run_json(dir.path(), &["status", "--user", "bob"]);
    assert_eq!(bob["lives"], 5);
}

#[test]
fn test_milestone_list_and_locked_claim() {
    let dir = tempfile::tempdir().unwrap();
    let list = run_json(dir.path(), &["milestones", "list"]);
    assert_eq!(list[0]["days"], 3);
    assert_eq!(list[0]["status"], "locked");

    let (_, stderr, code) = run_cli(dir.path(), &["milestones", "claim", "3"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("locked"), "{stderr}");
}

#[test]
fn test_config_get_set_reset() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "resource.max_count"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "5");

    let (stdout, _, code) = run_cli(dir.path(), &["config", "set", "resource.max_count", "7"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");
    let status = run_json(dir.path(), &["status"]);
    // The profile is created after the change, so it gets the new size.
    assert_eq!(status["max_lives"], 7);

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "streak.timezone", "nowhere"]);
    assert_eq!(code, 1);

    let (_, _, code) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "resource.max_count"]);
    assert_eq!(stdout.trim(), "5");
}

#[test]
fn test_unknown_config_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "nope.nothing"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_countdown_prints_frame() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["lives", "spend"]);
    let (stdout, _, code) = run_cli(dir.path(), &["lives", "countdown"]);
    assert_eq!(code, 0);
    let frame: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(frame["count"], 4);
    assert!(frame["label"].as_str().unwrap().contains(':'));
}
