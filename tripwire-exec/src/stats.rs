use std::collections::BTreeMap;

use parking_lot::Mutex;
use tripwire_core::ErrorKind;

/// Guarded-call counters for one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CallStats {
    pub calls: u64,
    pub successes: u64,
    pub failures: u64,
    /// Calls skipped because the circuit was open.
    pub rejected: u64,
    /// Attempts beyond the first, summed over all calls.
    pub retries: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_kind: Option<ErrorKind>,
}

impl CallStats {
    pub fn record_success(&mut self, attempts: u32) {
        self.calls += 1;
        self.successes += 1;
        self.retries += u64::from(attempts.saturating_sub(1));
    }

    pub fn record_failure(&mut self, attempts: u32, kind: ErrorKind) {
        self.calls += 1;
        self.failures += 1;
        self.retries += u64::from(attempts.saturating_sub(1));
        self.last_error_kind = Some(kind);
    }

    pub fn record_rejected(&mut self) {
        self.calls += 1;
        self.rejected += 1;
    }
}

/// Per-resource [`CallStats`], owned by a [`crate::Resilience`].
#[derive(Debug, Default)]
pub struct StatsCollector {
    stats: Mutex<BTreeMap<String, CallStats>>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, name: &str, f: impl FnOnce(&mut CallStats) -> R) -> R {
        let mut stats = self.stats.lock();
        f(stats.entry(name.to_string()).or_default())
    }

    pub fn record_success(&self, name: &str, attempts: u32) {
        self.with(name, |s| s.record_success(attempts));
    }

    pub fn record_failure(&self, name: &str, attempts: u32, kind: ErrorKind) {
        self.with(name, |s| s.record_failure(attempts, kind));
    }

    pub fn record_rejected(&self, name: &str) {
        self.with(name, |s| s.record_rejected());
    }

    pub fn get(&self, name: &str) -> Option<CallStats> {
        self.stats.lock().get(name).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<String, CallStats> {
        self.stats.lock().clone()
    }
}
