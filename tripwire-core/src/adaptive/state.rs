use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::adaptive::config::AdaptiveConfig;
use crate::clock::elapsed;
use crate::kind::ErrorKind;

/// Outcome of one complete attempt sequence.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RetryRecord {
    pub timestamp: DateTime<Utc>,
    pub attempts: u32,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::secs::option")]
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adaptation {
    pub previous: u32,
    pub current: u32,
    pub samples: usize,
}

/// Rolling history and adapted attempt ceiling for one service; also the
/// persisted snapshot.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AdaptiveState {
    pub service_name: String,
    pub current_max_attempts: u32,
    #[serde(default)]
    pub history: VecDeque<RetryRecord>,
    #[serde(default)]
    pub last_adaptation_time: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub config: AdaptiveConfig,
}

/// Read-only view over an [`AdaptiveState`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RetryStats {
    pub service_name: String,
    pub current_max_attempts: u32,
    pub min_attempts: u32,
    pub max_attempts: u32,
    pub window_size: usize,
    pub samples: usize,
    pub success_rate: f64,
    pub average_attempts: f64,
    pub success_rate_by_attempt: BTreeMap<u32, f64>,
    pub failures_by_kind: BTreeMap<ErrorKind, usize>,
    pub last_adaptation_time: Option<DateTime<Utc>>,
}

impl AdaptiveState {
    pub fn new(service_name: impl Into<String>, config: AdaptiveConfig) -> Self {
        Self {
            service_name: service_name.into(),
            current_max_attempts: clamp_ceiling(config.initial_max_attempts, &config),
            history: VecDeque::new(),
            last_adaptation_time: None,
            config,
        }
    }

    /// Rebuilds state from a persisted snapshot, keeping its history, adapted
    /// ceiling and adaptation time under the current `config`.
    pub fn restore(saved: AdaptiveState, config: AdaptiveConfig) -> Self {
        let mut s = Self::new(saved.service_name, config);
        s.current_max_attempts = clamp_ceiling(saved.current_max_attempts, &s.config);
        s.history = saved.history;
        s.last_adaptation_time = saved.last_adaptation_time;
        s.evict();
        s
    }

    fn evict(&mut self) {
        while self.history.len() > self.config.window_size {
            self.history.pop_front();
        }
    }

    /// Live ceiling, tightened by `kind_ceiling` when that is smaller.
    pub fn max_attempts(&self, kind_ceiling: Option<u32>) -> u32 {
        match kind_ceiling {
            Some(k) => self.current_max_attempts.min(k),
            None => self.current_max_attempts,
        }
    }

    pub fn adaptation_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_adaptation_time {
            Some(t) => elapsed(now, t) >= self.config.adaptation_interval,
            None => true,
        }
    }

    /// Appends `record`, evicts beyond the window and adapts when due.
    pub fn record(&mut self, record: RetryRecord) -> Option<Adaptation> {
        let now = record.timestamp;
        self.history.push_back(record);
        self.evict();
        if self.adaptation_due(now) {
            self.adapt(now)
        } else {
            None
        }
    }

    /// Recomputes `current_max_attempts` from the history window.
    ///
    /// Returns `None` without touching anything when there are fewer than
    /// `min_samples` records.
    pub fn adapt(&mut self, now: DateTime<Utc>) -> Option<Adaptation> {
        if self.history.len() < self.config.min_samples {
            return None;
        }
        let previous = self.current_max_attempts;
        self.current_max_attempts = compute_ceiling(
            self.history.iter(),
            previous,
            self.config.min_attempts,
            self.config.max_attempts,
            self.config.marginal_threshold,
        );
        self.last_adaptation_time = Some(now);
        Some(Adaptation {
            previous,
            current: self.current_max_attempts,
            samples: self.history.len(),
        })
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.current_max_attempts = clamp_ceiling(self.config.initial_max_attempts, &self.config);
        self.last_adaptation_time = None;
    }

    pub fn success_rate(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let ok = self.history.iter().filter(|r| r.success).count();
        ok as f64 / self.history.len() as f64
    }

    pub fn average_attempts(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let total: u64 = self.history.iter().map(|r| u64::from(r.attempts)).sum();
        total as f64 / self.history.len() as f64
    }

    /// Marginal success rate for every attempt index seen in the window.
    pub fn success_rate_by_attempt(&self) -> BTreeMap<u32, f64> {
        let top = self.history.iter().map(|r| r.attempts).max().unwrap_or(0);
        (1..=top)
            .filter_map(|a| marginal_rate(self.history.iter(), a).map(|rate| (a, rate)))
            .collect()
    }

    pub fn failures_by_kind(&self) -> BTreeMap<ErrorKind, usize> {
        let mut out = BTreeMap::new();
        for r in self.history.iter().filter(|r| !r.success) {
            *out.entry(r.error_kind.unwrap_or(ErrorKind::Unknown)).or_insert(0) += 1;
        }
        out
    }

    pub fn stats(&self) -> RetryStats {
        RetryStats {
            service_name: self.service_name.clone(),
            current_max_attempts: self.current_max_attempts,
            min_attempts: self.config.min_attempts,
            max_attempts: self.config.max_attempts,
            window_size: self.config.window_size,
            samples: self.history.len(),
            success_rate: self.success_rate(),
            average_attempts: self.average_attempts(),
            success_rate_by_attempt: self.success_rate_by_attempt(),
            failures_by_kind: self.failures_by_kind(),
            last_adaptation_time: self.last_adaptation_time,
        }
    }
}

fn clamp_ceiling(v: u32, cfg: &AdaptiveConfig) -> u32 {
    let lo = cfg.min_attempts.max(1);
    v.clamp(lo, cfg.max_attempts.max(lo))
}

/// `#(success at exactly a) / #(reached a)`, or `None` when nothing reached `a`.
fn marginal_rate<'a>(history: impl Iterator<Item = &'a RetryRecord>, a: u32) -> Option<f64> {
    let (mut hits, mut reached) = (0usize, 0usize);
    for r in history {
        if r.attempts >= a {
            reached += 1;
            if r.success && r.attempts == a {
                hits += 1;
            }
        }
    }
    (reached > 0).then(|| hits as f64 / reached as f64)
}

/// Walks attempt counts upward from `min_attempts + 1` and keeps the last one
/// whose marginal success rate clears `threshold`.
///
/// A candidate no record reached carries no evidence either way. The walk
/// stops there and keeps `previous`, or grants that one untested attempt when
/// `previous` is lower, so a ceiling that fell to `min_attempts` can recover.
pub fn compute_ceiling<'a>(
    history: impl Iterator<Item = &'a RetryRecord> + Clone,
    previous: u32,
    min_attempts: u32,
    max_attempts: u32,
    threshold: f64,
) -> u32 {
    let mut adopted = min_attempts;
    for a in min_attempts.saturating_add(1)..=max_attempts {
        match marginal_rate(history.clone(), a) {
            Some(rate) if rate >= threshold => adopted = a,
            Some(_) => break,
            None => {
                adopted = a.max(previous).min(max_attempts);
                break;
            }
        }
    }
    adopted
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn rec(attempts: u32, success: bool) -> RetryRecord {
        RetryRecord {
            timestamp: t0(),
            attempts,
            success,
            error_kind: (!success).then_some(ErrorKind::Timeout),
            duration: None,
        }
    }

    fn push(s: &mut AdaptiveState, n: usize, attempts: u32, success: bool) {
        for _ in 0..n {
            s.history.push_back(rec(attempts, success));
        }
    }

    fn cfg() -> AdaptiveConfig {
        AdaptiveConfig {
            window_size: 10_000,
            max_attempts: 3,
            ..Default::default()
        }
    }

    #[test]
    fn stops_where_marginal_benefit_drops_below_threshold() {
        let mut s = AdaptiveState::new("yahoo_finance", cfg());
        // attempt 1: 90% of 2500 succeed
        push(&mut s, 2250, 1, true);
        // attempt 2: 40% of the 250 that reached it
        push(&mut s, 100, 2, true);
        // attempt 3: 2% of the 150 that reached it
        push(&mut s, 3, 3, true);
        push(&mut s, 147, 3, false);

        let a = s.adapt(t0()).unwrap();
        assert_eq!(a.previous, 3);
        assert_eq!(a.current, 2);
        assert_eq!(s.current_max_attempts, 2);
        assert_eq!(s.last_adaptation_time, Some(t0()));
    }

    #[test]
    fn unreached_attempts_keep_the_previous_ceiling() {
        let mut s = AdaptiveState::new("twse", cfg());
        push(&mut s, 20, 1, true);
        s.adapt(t0());
        assert_eq!(s.current_max_attempts, 3);
    }

    #[test]
    fn ceiling_at_minimum_recovers_once_retries_pay_off() {
        let mut s = AdaptiveState::new("twse", cfg());
        // second attempts never help: drop to one attempt
        push(&mut s, 20, 1, true);
        push(&mut s, 20, 2, false);
        s.adapt(t0());
        assert_eq!(s.current_max_attempts, 1);

        // with a single attempt allowed, nothing reaches attempt 2
        s.history.clear();
        push(&mut s, 30, 1, true);
        push(&mut s, 10, 1, false);
        s.adapt(t0());
        assert_eq!(s.current_max_attempts, 2);

        // the granted retry succeeds often enough to be kept
        push(&mut s, 10, 2, true);
        s.adapt(t0());
        assert_eq!(s.current_max_attempts, 3);
    }

    #[test]
    fn falls_back_to_min_attempts_when_first_candidate_fails() {
        let mut s = AdaptiveState::new("twse", cfg());
        push(&mut s, 20, 1, true);
        push(&mut s, 20, 3, false);
        s.adapt(t0());
        assert_eq!(s.current_max_attempts, 1);
    }

    #[test]
    fn skips_adaptation_below_min_samples() {
        let mut s = AdaptiveState::new("twse", cfg());
        push(&mut s, 9, 3, false);
        assert_eq!(s.adapt(t0()), None);
        assert_eq!(s.current_max_attempts, 3);
        assert_eq!(s.last_adaptation_time, None);
    }

    #[test]
    fn record_evicts_oldest_beyond_window() {
        let mut s = AdaptiveState::new(
            "twse",
            AdaptiveConfig {
                window_size: 3,
                ..Default::default()
            },
        );
        for attempts in 1..=5 {
            s.record(rec(attempts, true));
        }
        let kept: Vec<u32> = s.history.iter().map(|r| r.attempts).collect();
        assert_eq!(kept, vec![3, 4, 5]);
    }

    #[test]
    fn record_adapts_only_once_per_interval() {
        let mut s = AdaptiveState::new("twse", cfg());
        push(&mut s, 20, 1, true);
        assert!(s.record(rec(1, true)).is_some());
        assert!(s.record(rec(1, true)).is_none());

        let mut later = rec(1, true);
        later.timestamp = t0() + chrono::Duration::hours(1);
        assert!(s.record(later).is_some());
    }

    #[test]
    fn kind_ceiling_only_tightens() {
        let s = AdaptiveState::new("twse", cfg());
        assert_eq!(s.max_attempts(None), 3);
        assert_eq!(s.max_attempts(Some(1)), 1);
        assert_eq!(s.max_attempts(Some(5)), 3);
    }

    #[test]
    fn stats_summarize_window() {
        let mut s = AdaptiveState::new("twse", cfg());
        push(&mut s, 2, 1, true);
        push(&mut s, 1, 2, true);
        push(&mut s, 1, 3, false);
        let st = s.stats();
        assert_eq!(st.samples, 4);
        assert!((st.success_rate - 0.75).abs() < 1e-9);
        assert!((st.average_attempts - 1.75).abs() < 1e-9);
        assert!((st.success_rate_by_attempt[&1] - 0.5).abs() < 1e-9);
        assert!((st.success_rate_by_attempt[&2] - 0.5).abs() < 1e-9);
        assert_eq!(st.success_rate_by_attempt[&3], 0.0);
        assert_eq!(st.failures_by_kind[&ErrorKind::Timeout], 1);
    }

    #[test]
    fn reset_restores_initial_ceiling() {
        let mut s = AdaptiveState::new("twse", cfg());
        push(&mut s, 20, 1, true);
        push(&mut s, 20, 3, false);
        s.adapt(t0());
        assert_eq!(s.current_max_attempts, 1);
        s.reset();
        assert_eq!(s.current_max_attempts, 3);
        assert!(s.history.is_empty());
        assert_eq!(s.last_adaptation_time, None);
    }
}
