//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data
//! directory and a fixed day/now so outputs are deterministic.

use std::path::Path;
use std::process::Command;

const DATE: &str = "2026-03-02";
const NOW: &str = "2026-03-02T08:00:00Z";

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_dayflow"))
        .env("DAYFLOW_HOME", home)
        .env_remove("DAYFLOW_LOG")
        .args(["--date", DATE, "--now", NOW])
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("stdout should be JSON")
}

fn added_id(stdout: &str) -> String {
    stdout
        .trim()
        .rsplit(": ")
        .next()
        .expect("id after colon")
        .to_string()
}

#[test]
fn test_block_add_and_list() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["block", "add", "Write", "--start", "09:00", "--minutes", "60"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Block added:"));

    let (code, stdout, _) = run_cli(home.path(), &["block", "list", "--json"]);
    assert_eq!(code, 0);
    let blocks = json(&stdout);
    let blocks = blocks.as_array().unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0]["title"], "Write");
    assert_eq!(blocks[0]["duration_seconds"], 3600);
}

#[test]
fn test_overlapping_block_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    run_cli(home.path(), &["block", "add", "A", "--start", "09:00", "--minutes", "60"]);
    let (code, _, stderr) = run_cli(home.path(), &["block", "add", "B", "--start", "09:30", "--minutes", "30"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (_, stdout, _) = run_cli(home.path(), &["block", "list", "--json"]);
    assert_eq!(json(&stdout).as_array().unwrap().len(), 1);
}

#[test]
fn test_gap_list_on_empty_day() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["gap", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("06:00-22:00"));
    assert!(stdout.contains("960 min"));
}

#[test]
fn test_chain_template_place() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["chain", "add-template", "morning-routine"]);
    assert_eq!(code, 0);
    let id = added_id(&stdout);

    let (code, stdout, _) = run_cli(home.path(), &["chain", "place", &id, "--start", "07:00", "--json"]);
    assert_eq!(code, 0);
    let blocks = json(&stdout);
    let blocks = blocks.as_array().unwrap();
    assert_eq!(blocks.len(), 4);
    assert!(blocks[0]["start_time"].as_str().unwrap().contains("T07:00:00"));
    // 10 minute first step plus the 5 minute buffer
    assert!(blocks[1]["start_time"].as_str().unwrap().contains("T07:15:00"));
    assert!(blocks.iter().all(|b| b["chain_id"] == id.as_str()));
}

#[test]
fn test_unknown_template_fails() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["chain", "add-template", "lunch-party"]);
    assert_ne!(code, 0);
}

#[test]
fn test_suggest_resolve_applies_confident_event() {
    let home = tempfile::tempdir().unwrap();
    let request = home.path().join("request.json");
    std::fs::write(
        &request,
        r#"{
            "action": "create-event",
            "confidence": 0.9,
            "request_text": "dentist at 3pm",
            "suggestions": [{"title": "Dentist", "duration_seconds": 3600, "confidence": 0.9}]
        }"#,
    )
    .unwrap();

    let (code, stdout, _) = run_cli(home.path(), &["suggest", "resolve", request.to_str().unwrap()]);
    assert_eq!(code, 0, "{stdout}");
    assert!(stdout.contains("Applied"));
    assert!(stdout.contains("15:00-16:00"));

    let (_, stdout, _) = run_cli(home.path(), &["suggest", "pending", "--json"]);
    assert!(json(&stdout).as_array().unwrap().is_empty());
}

#[test]
fn test_suggest_stage_then_accept() {
    let home = tempfile::tempdir().unwrap();
    let request = home.path().join("request.json");
    std::fs::write(
        &request,
        r#"{
            "action": "create-event",
            "confidence": 0.55,
            "request_text": "maybe read something",
            "suggestions": [{"title": "Reading", "duration_seconds": 1800, "confidence": 0.55}]
        }"#,
    )
    .unwrap();

    let (code, stdout, _) = run_cli(home.path(), &["suggest", "resolve", request.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Staged for approval:"));

    let (_, stdout, _) = run_cli(home.path(), &["suggest", "pending", "--json"]);
    let pending = json(&stdout);
    let id = pending[0]["id"].as_str().unwrap().to_string();

    let (code, _, _) = run_cli(home.path(), &["suggest", "accept", &id]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["block", "list", "--json"]);
    let blocks = json(&stdout);
    assert_eq!(blocks[0]["title"], "Reading");
    assert_eq!(blocks[0]["state"], "mist");
}

#[test]
fn test_pillar_due_and_schedule() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        home.path(),
        &["pillar", "add", "Exercise", "--cadence", "3 times a week", "--min", "45", "--max", "60", "--prefer", "09:00-10:00"],
    );
    assert_eq!(code, 0);
    let id = added_id(&stdout);

    let (_, stdout, _) = run_cli(home.path(), &["pillar", "due"]);
    assert!(stdout.contains("Exercise (never done)"));

    let (code, stdout, _) = run_cli(home.path(), &["pillar", "schedule", &id]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Scheduled Exercise at 09:00"));

    let (_, stdout, _) = run_cli(home.path(), &["block", "list", "--json"]);
    let blocks = json(&stdout);
    assert_eq!(blocks[0]["related_pillar_id"], id.as_str());
    assert_eq!(blocks[0]["duration_seconds"], 45 * 60);
}

#[test]
fn test_backfill_preview_does_not_commit() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["backfill", "--json"]);
    assert_eq!(code, 0);
    assert!(!json(&stdout).as_array().unwrap().is_empty());

    let (_, stdout, _) = run_cli(home.path(), &["block", "list", "--json"]);
    assert!(json(&stdout).as_array().unwrap().is_empty());

    let (code, _, _) = run_cli(home.path(), &["backfill", "--commit"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["block", "list", "--json"]);
    assert!(!json(&stdout).as_array().unwrap().is_empty());
}

#[test]
fn test_config_get_set() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "day.day_start"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "06:00");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "chain.buffer_minutes", "10"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "chain.buffer_minutes"]);
    assert_eq!(stdout.trim(), "10");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "day.day_start", "not-a-time"]);
    assert_ne!(code, 0);
}

#[test]
fn test_out_of_range_durations_fail_without_panicking() {
    let home = tempfile::tempdir().unwrap();
    let huge = i64::MAX.to_string();

    let (code, _, stderr) = run_cli(home.path(), &["block", "add", "Forever", "--start", "09:00", "--minutes", &huge]);
    assert_eq!(code, 1);
    assert!(stderr.contains("out of range"), "{stderr}");
    assert!(!stderr.contains("panicked"));

    let step = format!("Work:{huge}");
    let (code, _, stderr) = run_cli(home.path(), &["chain", "add", "Endless", "--step", &step]);
    assert_eq!(code, 1);
    assert!(!stderr.contains("panicked"));

    let (code, stdout, _) = run_cli(home.path(), &["block", "add", "Write", "--start", "09:00", "--minutes", "60"]);
    assert_eq!(code, 0);
    let id = added_id(&stdout);
    let (code, _, stderr) = run_cli(home.path(), &["block", "resize", &id, "--minutes", &huge]);
    assert_eq!(code, 1);
    assert!(!stderr.contains("panicked"));

    // crosses midnight
    let (code, _, _) = run_cli(home.path(), &["block", "add", "Late", "--start", "23:00", "--minutes", "120"]);
    assert_eq!(code, 1);

    let (_, stdout, _) = run_cli(home.path(), &["block", "list", "--json"]);
    let blocks = json(&stdout);
    assert_eq!(blocks.as_array().unwrap().len(), 1);
    assert_eq!(blocks[0]["duration_seconds"], 3600);
}

#[test]
fn test_block_energy_follows_local_clock() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["config", "set", "day.utc_offset_minutes", "540"]);
    assert_eq!(code, 0);

    // 20:00 at UTC+9 is 11:00 UTC
    let (code, _, _) = run_cli(home.path(), &["block", "add", "Read", "--start", "20:00", "--minutes", "30"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["block", "list", "--json"]);
    let blocks = json(&stdout);
    assert_eq!(blocks[0]["energy"], "moonlight");
    assert!(blocks[0]["start_time"].as_str().unwrap().contains("T11:00:00"));
}
