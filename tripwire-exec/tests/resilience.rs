use std::sync::Arc;

use tempfile::TempDir;
use tripwire_core::{CircuitState, ConfigFormat, ErrorKind, TripwireConfig, parse_config_str};
use tripwire_exec::{CallOutcome, Resilience};
use tripwire_store::{Document, JsonFileStore, StateStore};

fn config(yaml: &str) -> TripwireConfig {
    parse_config_str(yaml, ConfigFormat::Yaml).unwrap()
}

fn on_dir(dir: &TempDir, cfg: TripwireConfig) -> Resilience {
    Resilience::builder().config(cfg).state_dir(dir.path()).build().unwrap()
}

#[test]
fn same_name_shares_one_instance() {
    let dir = TempDir::new().unwrap();
    let r = on_dir(&dir, TripwireConfig::default());
    assert!(Arc::ptr_eq(&r.breaker("twse"), &r.breaker("twse")));
    assert!(Arc::ptr_eq(&r.retry_policy("twse"), &r.retry_policy("twse")));
    assert!(!Arc::ptr_eq(&r.breaker("twse"), &r.breaker("line_notify")));
}

#[test]
fn per_name_breaker_config_applies() {
    let dir = TempDir::new().unwrap();
    let r = on_dir(
        &dir,
        config("circuit_breaker:\n  failure_threshold: 4\ncircuit_breakers:\n  line_notify:\n    failure_threshold: 2\n"),
    );
    assert_eq!(r.breaker("line_notify").get_state().config.failure_threshold, 2);
    assert_eq!(r.breaker("twse").get_state().config.failure_threshold, 4);
}

#[test]
fn open_circuit_rejects_without_running() {
    let dir = TempDir::new().unwrap();
    let r = on_dir(&dir, config("circuit_breakers:\n  line_notify:\n    failure_threshold: 1\n"));

    let first: CallOutcome<(), &str> = r.call_blocking("line_notify", || Err("403 Forbidden"));
    assert_eq!(first, CallOutcome::Failed("403 Forbidden"));
    assert_eq!(r.breaker("line_notify").state(), CircuitState::Open);

    let mut ran = false;
    let second: CallOutcome<(), &str> = r.call_blocking("line_notify", || {
        ran = true;
        Ok(())
    });
    assert!(second.is_rejected());
    assert!(!ran);

    let stats = &r.call_stats()["line_notify"];
    assert_eq!(stats.calls, 2);
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.last_error_kind, Some(ErrorKind::Auth));
}

#[tokio::test(start_paused = true)]
async fn async_call_counts_retries() {
    let dir = TempDir::new().unwrap();
    let r = on_dir(&dir, TripwireConfig::default());
    let mut n = 0;

    let out: CallOutcome<u32, String> = r
        .call("yahoo_finance", || {
            n += 1;
            let attempt = n;
            async move {
                if attempt == 1 {
                    Err("502 Bad Gateway".to_string())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

    assert_eq!(out.ok(), Some(2));
    let stats = &r.call_stats()["yahoo_finance"];
    assert_eq!(stats.successes, 1);
    assert_eq!(stats.retries, 1);
    assert_eq!(r.breaker("yahoo_finance").get_state().success_count, 1);
}

#[test]
fn all_states_include_persisted_only_breakers() {
    let dir = TempDir::new().unwrap();
    {
        let r = on_dir(&dir, TripwireConfig::default());
        r.breaker("twse").record_failure();
    }
    let r = on_dir(&dir, TripwireConfig::default());
    r.breaker("line_notify");

    let states = r.get_all_states();
    assert_eq!(states.keys().map(String::as_str).collect::<Vec<_>>(), vec!["line_notify", "twse"]);
    assert_eq!(states["twse"].failure_count, 1);
}

const HALF_OPEN: &str = r#"{
  "twse": {
    "name": "twse",
    "state": "half_open",
    "failure_count": 5,
    "success_count": 1,
    "half_open_calls": 1,
    "last_failure_time": "2024-03-01T09:00:00Z",
    "last_state_change": "2024-03-01T09:05:00Z",
    "failure_threshold": 5,
    "reset_timeout": 300.0,
    "half_open_max_calls": 3
  }
}"#;

#[test]
fn reading_state_leaves_the_store_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("circuit_breakers.json");
    std::fs::write(&path, HALF_OPEN).unwrap();
    let r = on_dir(&dir, TripwireConfig::default());

    let state = r.breaker_state("twse");
    assert_eq!(state.state, CircuitState::Open);
    assert_eq!(state.failure_count, 5);
    assert_eq!(r.get_all_states()["twse"].state, CircuitState::Open);

    let fresh = r.breaker_state("line_notify");
    assert_eq!(fresh.state, CircuitState::Closed);
    assert_eq!(fresh.config.failure_threshold, 5);

    assert_eq!(std::fs::read_to_string(&path).unwrap(), HALF_OPEN);
    assert!(!r.get_all_states().contains_key("line_notify"));
}

#[test]
fn live_breaker_state_wins_over_the_store() {
    let dir = TempDir::new().unwrap();
    let r = on_dir(&dir, TripwireConfig::default());
    let b = r.breaker("twse");
    b.record_failure();
    b.record_failure();
    assert_eq!(r.breaker_state("twse"), b.get_state());
    assert_eq!(r.breaker_state("twse").failure_count, 2);
}

#[test]
fn reset_all_closes_breakers_and_deletes_document() {
    let dir = TempDir::new().unwrap();
    let r = on_dir(&dir, config("circuit_breaker:\n  failure_threshold: 1\n"));
    r.breaker("twse").record_failure();
    assert!(dir.path().join("circuit_breakers.json").exists());

    r.reset_all();
    assert_eq!(r.breaker("twse").state(), CircuitState::Closed);
    assert!(!dir.path().join("circuit_breakers.json").exists());
    assert_eq!(r.get_all_states()["twse"].failure_count, 0);
}

#[test]
fn reset_all_history_clears_every_service() {
    let dir = TempDir::new().unwrap();
    let r = on_dir(&dir, TripwireConfig::default());
    r.retry_policy("twse").record_result(1, true, None, None);
    r.retry_policy("line_notify").record_result(2, false, Some(ErrorKind::Server), None);
    assert_eq!(r.get_all_stats().len(), 2);

    r.reset_all_history();
    let store = JsonFileStore::new(dir.path());
    assert!(store.load(Document::RetryHistory).unwrap().is_empty());
    assert!(r.get_all_stats().values().all(|s| s.samples == 0));
}

#[test]
fn corrupt_history_degrades_to_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("retry_history.json"), "[1, 2").unwrap();
    let r = on_dir(&dir, TripwireConfig::default());

    let stats = r.retry_policy("twse").get_stats();
    assert_eq!(stats.samples, 0);
    assert_eq!(stats.current_max_attempts, 3);
    assert!(r.get_all_stats().contains_key("twse"));
}

#[test]
fn invalid_pattern_fails_build() {
    let cfg = config("patterns:\n  data:\n    - \"(unclosed\"\n");
    assert!(Resilience::new(cfg).is_err());
}
