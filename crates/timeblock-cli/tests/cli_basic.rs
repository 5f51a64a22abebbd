//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (code, stdout, stderr).
fn run_cli(dir: &Path, args: &[&str]) -> (i32, String, String) {
    run_cli_with_input(dir, args, "")
}

fn run_cli_with_input(dir: &Path, args: &[&str], input: &str) -> (i32, String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_timeblock-cli"))
        .args(args)
        .env("TIMEBLOCK_DATA_DIR", dir)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("stdout should be JSON")
}

#[test]
fn test_presets_lists_builtin_catalog() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["timer", "presets"]);
    assert_eq!(code, 0);

    let rows = json(&stdout);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["name"], "Classic");
    assert_eq!(rows[0]["active"], true);
    assert_eq!(rows[2]["name"], "Deep Work");
}

#[test]
fn test_status_is_idle_with_defaults() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0);

    let snap = json(&stdout);
    assert_eq!(snap["status"], "idle");
    assert_eq!(snap["mode"], "pomodoro");
    assert_eq!(snap["audioEnabled"], true);
}

#[test]
fn test_prefs_persist_between_invocations() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_cli(dir.path(), &["prefs", "mode", "countdown"]).0, 0);
    assert_eq!(run_cli(dir.path(), &["prefs", "preset", "2"]).0, 0);
    assert_eq!(run_cli(dir.path(), &["prefs", "audio", "off"]).0, 0);

    let (code, stdout, _) = run_cli(dir.path(), &["prefs", "show"]);
    assert_eq!(code, 0);
    let prefs = json(&stdout);
    assert_eq!(prefs["mode"], "countdown");
    assert_eq!(prefs["pomodoroPresetIndex"], 2);
    assert_eq!(prefs["presetName"], "Deep Work");
    assert_eq!(prefs["audioEnabled"], false);
}

#[test]
fn test_prefs_rejects_unknown_preset() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["prefs", "preset", "9"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no preset at index 9"));
}

#[test]
fn test_config_set_then_get() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "set", "timer.countdown_minutes", "40"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.countdown_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "40");
}

#[test]
fn test_config_rejects_unknown_key_and_bad_value() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_cli(dir.path(), &["config", "get", "timer.nope"]).0, 1);
    assert_eq!(
        run_cli(dir.path(), &["config", "set", "timer.countdown_minutes", "0"]).0,
        1
    );

    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.countdown_minutes"]);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_stats_start_empty() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["stats", "all"]);
    assert_eq!(code, 0);
    let stats = json(&stdout);
    assert_eq!(stats["total_phases"], 0);
    assert_eq!(stats["completed_pomodoros"], 0);
}

#[test]
fn test_activity_done_is_listed_once() {
    let dir = TempDir::new().unwrap();
    for _ in 0..2 {
        let (code, _, _) = run_cli(
            dir.path(),
            &["activity", "done", "stretch", "--date", "2026-10-19"],
        );
        assert_eq!(code, 0);
    }

    let (code, stdout, _) = run_cli(dir.path(), &["activity", "list", "--date", "2026-10-19"]);
    assert_eq!(code, 0);
    let done = json(&stdout);
    let done = done.as_array().unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0]["activity_id"], "stretch");
}

#[test]
fn test_timer_run_stops_on_quit() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli_with_input(
        dir.path(),
        &["timer", "run", "--block", "b1", "--mode", "stopwatch", "--json"],
        "p\nq\n",
    );
    assert_eq!(code, 0);

    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let types: Vec<&str> = lines.iter().filter_map(|v| v["type"].as_str()).collect();
    assert!(types.contains(&"ModeChanged"));
    assert!(types.contains(&"TimerStarted"));
    assert!(types.contains(&"TimerPaused"));
    assert_eq!(types.last(), Some(&"TimerStopped"));

    // Final line is the idle snapshot.
    let last = lines.last().unwrap();
    assert_eq!(last["status"], "idle");
    assert_eq!(last["mode"], "stopwatch");
}
