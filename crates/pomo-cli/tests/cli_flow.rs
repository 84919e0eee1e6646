//! End-to-end tests driving the `pomo` binary against a temporary database.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn pomo_binary() -> &'static str {
    env!("CARGO_BIN_EXE_pomo")
}

/// A sandboxed home with its own config and database.
struct Sandbox {
    temp: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.temp.path()
    }

    fn command(&self) -> Command {
        let mut command = Command::new(pomo_binary());
        command
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("XDG_DATA_HOME", self.path().join("data"))
            .env_remove("RUST_LOG")
            .env_remove("POMO_OWNER")
            .env_remove("POMO_MULTI_USER")
            .env_remove("POMO_LONG_BREAK")
            .env_remove("POMO_DATABASE_PATH");
        command
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("failed to run pomo")
    }

    /// Runs with `--json`, asserts success and parses stdout.
    fn json(&self, args: &[&str]) -> Value {
        let output = self.command().arg("--json").args(args).output().unwrap();
        assert!(
            output.status.success(),
            "pomo {args:?} failed: {}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    /// Runs with `--json`, asserts the exit code and parses the error body.
    fn json_error(&self, args: &[&str], code: i32) -> Value {
        let output = self.command().arg("--json").args(args).output().unwrap();
        assert_eq!(
            output.status.code(),
            Some(code),
            "unexpected exit for {args:?}: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

#[test]
fn test_start_state_stop_flow() {
    let sandbox = Sandbox::new();

    let created = sandbox.json(&["start", "--minutes", "25", "--tag", "Writing"]);
    assert_eq!(created["kind"], "focus");
    assert_eq!(created["planned_duration_seconds"], 1500);
    assert_eq!(created["tag"], "Writing");

    let state = sandbox.json(&["state"]);
    assert_eq!(state["mode"], "focus");
    let remaining = state["remaining_seconds"].as_i64().unwrap();
    assert!(remaining > 0 && remaining <= 1500);

    for _ in 0..2 {
        let ack = sandbox.json(&["stop"]);
        assert_eq!(ack, serde_json::json!({"status": "stopped"}));
    }

    let state = sandbox.json(&["state"]);
    assert_eq!(state["mode"], "idle");
    assert_eq!(state["remaining_seconds"], 0);
    assert_eq!(state["completed_focus_count"], 0);

    let id = created["id"].as_i64().unwrap().to_string();
    let shown = sandbox.json(&["show", &id]);
    assert_eq!(shown["status"], "aborted");
}

#[test]
fn test_default_database_lives_in_data_dir() {
    let sandbox = Sandbox::new();
    sandbox.json(&["state"]);
    assert!(sandbox.path().join("data/pomo/pomo.db").exists());
}

#[test]
fn test_second_start_conflicts() {
    let sandbox = Sandbox::new();
    sandbox.json(&["break"]);

    let body = sandbox.json_error(&["start"], 3);
    assert_eq!(body, serde_json::json!({"error": "Active session already exists"}));

    let state = sandbox.json(&["state"]);
    assert_eq!(state["mode"], "break");
    assert_eq!(state["planned_duration_seconds"], 300);
}

#[test]
fn test_invalid_input_exit_code_and_body() {
    let sandbox = Sandbox::new();

    let body = sandbox.json_error(&["start", "--minutes", "300"], 2);
    assert_eq!(
        body,
        serde_json::json!({
            "error": "Duration must be at most 240 minutes",
            "field": "duration_minutes",
        })
    );

    let body = sandbox.json_error(&["start", "--minutes", "soon"], 2);
    assert_eq!(body["error"], "Duration must be a number");

    let body = sandbox.json_error(&["start", "--minutes", "-5"], 2);
    assert_eq!(body["error"], "Duration must be at least 1 minute(s)");

    let long_tag = "A".repeat(51);
    let body = sandbox.json_error(&["start", "--tag", &long_tag], 2);
    assert_eq!(body["field"], "tag");

    let state = sandbox.json(&["state"]);
    assert_eq!(state["mode"], "idle");
}

#[test]
fn test_human_errors_go_to_stderr() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["start", "--minutes", "0"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Duration must be at least 1 minute(s)"));
}

#[test]
fn test_complete_updates_stats_and_tags() {
    let sandbox = Sandbox::new();
    let created = sandbox.json(&["start", "--minutes", "1", "--tag", "Code"]);
    let id = created["id"].as_i64().unwrap().to_string();

    let done = sandbox.json(&["complete", &id]);
    assert_eq!(done["completed"], true);
    let again = sandbox.json(&["complete", &id]);
    assert_eq!(again["completed"], false);

    let state = sandbox.json(&["state"]);
    assert_eq!(state["completed_focus_count"], 1);
    assert_eq!(state["total_focus_seconds"], 60);
    assert_eq!(state["cycle_count"], 1);

    let week = sandbox.json(&["stats", "week"]);
    let days = week.as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[6]["focus_count"], 1);
    assert_eq!(days[6]["completion_rate"], 1.0);

    let month = sandbox.json(&["stats", "month"]);
    assert_eq!(month.as_array().unwrap().len(), 30);

    let tags = sandbox.json(&["stats", "tags"]);
    assert_eq!(tags[0]["tag"], "Code");
    assert_eq!(tags[0]["total_focus_seconds"], 60);

    let recent = sandbox.json(&["tags"]);
    assert_eq!(recent, serde_json::json!(["Code"]));
}

#[test]
fn test_long_break_and_decline() {
    let sandbox = Sandbox::new();
    let ack = sandbox.json(&["decline"]);
    assert_eq!(ack, serde_json::json!({"status": "declined"}));

    let created = sandbox.json(&["long-break"]);
    assert_eq!(created["kind"], "break");
    assert_eq!(created["planned_duration_seconds"], 900);
    assert_eq!(created["tag"], Value::Null);
}

#[test]
fn test_preset_selects_length() {
    let sandbox = Sandbox::new();
    let created = sandbox.json(&["start", "--preset", "short"]);
    assert_eq!(created["planned_duration_seconds"], 900);
    sandbox.json(&["stop"]);

    let created = sandbox.json(&["break", "--preset", "long"]);
    assert_eq!(created["planned_duration_seconds"], 600);
    sandbox.json(&["stop"]);

    let body = sandbox.json_error(&["start", "--preset", "marathon"], 2);
    assert_eq!(body["field"], "preset");
}

#[test]
fn test_config_file_presets() {
    let sandbox = Sandbox::new();
    let config_path = sandbox.path().join("pomo.toml");
    std::fs::write(
        &config_path,
        "default_preset = \"deep\"\n\n[presets.deep]\nfocus = 90\nbreak = 20\n",
    )
    .unwrap();
    let config = config_path.to_str().unwrap();

    let presets = sandbox.json(&["--config", config, "presets"]);
    let names: Vec<&str> = presets
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["deep", "default", "long", "short"]);

    let created = sandbox.json(&["--config", config, "start"]);
    assert_eq!(created["planned_duration_seconds"], 5400);
}

#[test]
fn test_multi_user_requires_owner() {
    let sandbox = Sandbox::new();
    let multi = |args: &[&str]| {
        sandbox
            .command()
            .env("POMO_MULTI_USER", "true")
            .arg("--json")
            .args(args)
            .output()
            .unwrap()
    };

    let output = multi(&["state"]);
    assert_eq!(output.status.code(), Some(2));

    let output = multi(&["--owner", "alice", "start"]);
    assert!(output.status.success());

    let output = multi(&["--owner", "bob", "state"]);
    let state: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(state["mode"], "idle");

    let output = multi(&["--owner", "alice", "state"]);
    let state: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(state["mode"], "focus");
}

#[test]
fn test_show_missing_session_fails() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["show", "42"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("session 42 not found"));
}

#[test]
fn test_human_state_output() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["state"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    insta::assert_snapshot!(stdout, @r"
    Mode:      idle
    Today:     0 focus sessions, 00:00 focused
    Cycle:     0 of 4
    ");
}
