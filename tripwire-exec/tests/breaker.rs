use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;
use tripwire_core::{BreakerConfig, CircuitState, ManualClock};
use tripwire_exec::CircuitBreaker;
use tripwire_store::{Document, JsonFileStore, MemoryStore, StateStore, UPDATED_AT};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn config() -> BreakerConfig {
    BreakerConfig {
        failure_threshold: 3,
        reset_timeout: Duration::from_secs(300),
        half_open_max_calls: 2,
        ..Default::default()
    }
}

fn breaker(store: &Arc<dyn StateStore>, clock: &ManualClock) -> CircuitBreaker {
    CircuitBreaker::new("yahoo_finance", config(), Arc::clone(store), Arc::new(clock.clone()))
}

#[test]
fn full_cycle_through_half_open() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(t0());
    let b = breaker(&store, &clock);

    for _ in 0..3 {
        assert!(b.allow_request());
        b.record_failure();
    }
    assert_eq!(b.state(), CircuitState::Open);
    assert!(!b.allow_request());

    clock.advance(Duration::from_secs(301));
    assert!(b.allow_request());
    assert_eq!(b.state(), CircuitState::HalfOpen);

    b.record_success();
    assert_eq!(b.state(), CircuitState::HalfOpen);
    b.record_success();
    assert_eq!(b.state(), CircuitState::Closed);
    assert_eq!(b.get_state().failure_count, 0);
}

#[test]
fn failure_while_half_open_reopens() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(t0());
    let b = breaker(&store, &clock);
    for _ in 0..3 {
        b.record_failure();
    }
    clock.advance(Duration::from_secs(301));
    assert!(b.allow_request());
    b.record_failure();
    assert_eq!(b.state(), CircuitState::Open);
    assert!(!b.allow_request());
}

#[test]
fn every_mutation_is_persisted_with_timestamp() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(t0());
    let b = breaker(&store, &clock);
    b.record_failure();

    let entry = store
        .load_entry(Document::CircuitBreakers, "yahoo_finance")
        .unwrap()
        .unwrap();
    assert_eq!(entry["failure_count"], 1);
    assert_eq!(entry["state"], "closed");
    assert!(entry.get(UPDATED_AT).is_some());
}

#[test]
fn reload_from_file_matches_live_state() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::new(dir.path()));
    let clock = ManualClock::new(t0());

    let b = breaker(&store, &clock);
    b.record_failure();
    b.record_failure();
    b.record_success();
    let before = b.get_state();
    drop(b);

    let reloaded = breaker(&store, &clock);
    assert_eq!(reloaded.get_state(), before);
}

#[test]
fn half_open_is_demoted_to_open_on_reload() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(t0());
    let b = breaker(&store, &clock);
    for _ in 0..3 {
        b.record_failure();
    }
    clock.advance(Duration::from_secs(301));
    assert!(b.allow_request());
    assert_eq!(b.state(), CircuitState::HalfOpen);
    drop(b);

    let reloaded = breaker(&store, &clock);
    assert_eq!(reloaded.state(), CircuitState::Open);
    let saved = store
        .load_entry(Document::CircuitBreakers, "yahoo_finance")
        .unwrap()
        .unwrap();
    assert_eq!(saved["state"], "open");
}

#[test]
fn expired_open_is_promoted_to_half_open_on_reload() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(t0());
    let b = breaker(&store, &clock);
    for _ in 0..3 {
        b.record_failure();
    }
    drop(b);

    clock.advance(Duration::from_secs(600));
    let reloaded = breaker(&store, &clock);
    assert_eq!(reloaded.state(), CircuitState::HalfOpen);
}

#[test]
fn corrupt_document_falls_back_to_closed() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("circuit_breakers.json"), "{not json").unwrap();
    let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::new(dir.path()));
    let clock = ManualClock::new(t0());

    let b = breaker(&store, &clock);
    assert_eq!(b.state(), CircuitState::Closed);

    b.record_failure();
    let saved = store.load(Document::CircuitBreakers).unwrap();
    assert_eq!(saved["yahoo_finance"]["failure_count"], 1);
}

#[test]
fn reset_closes_and_clears_counters() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(t0());
    let b = breaker(&store, &clock);
    for _ in 0..3 {
        b.record_failure();
    }
    b.reset();
    let s = b.get_state();
    assert_eq!(s.state, CircuitState::Closed);
    assert_eq!(s.failure_count, 0);
    assert_eq!(s.last_failure_time, None);
}
