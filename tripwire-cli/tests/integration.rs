use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

fn tripwire(state: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tripwire").unwrap();
    cmd.env_remove("TRIPWIRE_STATE_DIR")
        .env_remove("TRIPWIRE_CONFIG")
        .arg("--state-dir")
        .arg(state.path());
    cmd
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

const BREAKERS: &str = r#"{
  "twse": {
    "name": "twse",
    "state": "open",
    "failure_count": 5,
    "success_count": 0,
    "half_open_calls": 0,
    "last_failure_time": "2099-01-01T00:00:00Z",
    "last_state_change": "2099-01-01T00:00:00Z",
    "failure_threshold": 5,
    "reset_timeout": 300.0,
    "half_open_max_calls": 3,
    "updated_at": "2099-01-01T00:00:00Z"
  }
}"#;

#[test]
fn test_classify_command() {
    let state = TempDir::new().unwrap();
    let v = stdout_json(tripwire(&state).args(["--format", "json", "classify", "503 connection refused"]));
    assert_eq!(v["kind"], "network");
    assert_eq!(v["recoverable"], true);
    assert_eq!(v["max_attempts"], 5);

    let v = stdout_json(tripwire(&state).args(["--format", "json", "classify", "HTTP 401"]));
    assert_eq!(v["kind"], "auth");
    assert_eq!(v["recoverable"], false);
}

#[test]
fn test_status_lists_persisted_breakers() {
    let state = TempDir::new().unwrap();
    fs::write(state.path().join("circuit_breakers.json"), BREAKERS).unwrap();

    let v = stdout_json(tripwire(&state).args(["status", "--format", "json"]));
    assert_eq!(v["twse"]["state"], "open");
    assert_eq!(v["twse"]["failure_count"], 5);

    let out = tripwire(&state).arg("status").assert().success().get_output().stdout.clone();
    assert!(String::from_utf8_lossy(&out).contains("twse: open"));
}

#[test]
fn test_status_of_one_breaker_does_not_rewrite_state() {
    let state = TempDir::new().unwrap();
    let path = state.path().join("circuit_breakers.json");
    let half_open = BREAKERS.replace(r#""state": "open""#, r#""state": "half_open""#);
    fs::write(&path, &half_open).unwrap();

    let v = stdout_json(tripwire(&state).args(["--format", "json", "status", "twse"]));
    assert_eq!(v["twse"]["state"], "open");
    tripwire(&state).args(["status", "line_notify"]).assert().success();

    assert_eq!(fs::read_to_string(&path).unwrap(), half_open);
}

#[test]
fn test_reset_all_breakers_deletes_document() {
    let state = TempDir::new().unwrap();
    let path = state.path().join("circuit_breakers.json");
    fs::write(&path, BREAKERS).unwrap();

    tripwire(&state).args(["reset", "--breakers"]).assert().success();
    assert!(!path.exists());

    let v = stdout_json(tripwire(&state).args(["--format", "json", "status"]));
    assert_eq!(v, serde_json::json!({}));
}

#[test]
fn test_reset_single_breaker_closes_it() {
    let state = TempDir::new().unwrap();
    fs::write(state.path().join("circuit_breakers.json"), BREAKERS).unwrap();

    tripwire(&state).args(["-q", "reset", "twse", "--breakers"]).assert().success();

    let v = stdout_json(tripwire(&state).args(["--format", "json", "status", "twse"]));
    assert_eq!(v["twse"]["state"], "closed");
    assert_eq!(v["twse"]["failure_count"], 0);
}

#[test]
fn test_stats_empty_history() {
    let state = TempDir::new().unwrap();
    let v = stdout_json(tripwire(&state).args(["--format", "json", "stats", "twse"]));
    assert_eq!(v["twse"]["samples"], 0);
    assert_eq!(v["twse"]["current_max_attempts"], 3);
}

#[test]
fn test_config_schedule_without_jitter() {
    let state = TempDir::new().unwrap();
    let v = stdout_json(tripwire(&state).args([
        "--format",
        "json",
        "config",
        "--service",
        "yahoo_finance",
        "--attempts",
        "3",
    ]));
    assert_eq!(v["max_attempts"], 3);
    assert_eq!(v["delays"], serde_json::json!([2.0, 4.0, 8.0]));
}

#[test]
fn test_config_rejects_unknown_kind() {
    let state = TempDir::new().unwrap();
    tripwire(&state)
        .args(["config", "--kind", "meteor"])
        .assert()
        .failure()
        .code(2); // VALIDATION_FAILED
}

#[test]
fn test_invalid_config_file() {
    let state = TempDir::new().unwrap();
    let cfg = state.path().join("tripwire.yaml");
    fs::write(&cfg, "circuit_breaker:\n  failure_threshold: 0\n").unwrap();

    tripwire(&state)
        .arg("--config")
        .arg(&cfg)
        .arg("status")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_config_file_overrides_service() {
    let state = TempDir::new().unwrap();
    let cfg = state.path().join("tripwire.json");
    fs::write(&cfg, r#"{"services": {"twse": {"max_attempts": 7}}}"#).unwrap();

    let v = stdout_json(
        tripwire(&state)
            .arg("--config")
            .arg(&cfg)
            .args(["--format", "json", "config", "--service", "twse"]),
    );
    assert_eq!(v["max_attempts"], 7);
}

#[test]
fn test_doctor_flags_corrupt_document() {
    let state = TempDir::new().unwrap();
    tripwire(&state).arg("doctor").assert().success();

    fs::write(state.path().join("retry_history.json"), "{oops").unwrap();
    let out = tripwire(&state)
        .args(["--format", "json", "doctor"])
        .assert()
        .failure()
        .code(4)
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["all_passed"], false);
}
