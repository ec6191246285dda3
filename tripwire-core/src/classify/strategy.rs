use std::collections::BTreeMap;
use std::time::Duration;

use crate::kind::ErrorKind;

/// Per-kind retry knobs.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RetryStrategy {
    pub max_attempts: u32,
    #[serde(with = "crate::secs")]
    pub base_delay: Duration,
    pub backoff_factor: f64,
    pub recoverable: bool,
    pub description: String,
}

impl RetryStrategy {
    fn new(max_attempts: u32, base_secs: f64, backoff_factor: f64, recoverable: bool, description: &str) -> Self {
        Self {
            max_attempts,
            base_delay: crate::secs::from_f64(base_secs),
            backoff_factor,
            recoverable,
            description: description.to_string(),
        }
    }

    pub fn defaults_for(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Network => Self::new(5, 2.0, 2.0, true, "network connectivity problem"),
            ErrorKind::Timeout => Self::new(3, 5.0, 2.0, true, "request timed out"),
            ErrorKind::RateLimit => Self::new(3, 30.0, 2.0, true, "rate limited by upstream"),
            ErrorKind::Auth => Self::new(1, 0.0, 1.0, false, "authentication or authorization failure"),
            ErrorKind::Server => Self::new(3, 5.0, 2.0, true, "upstream server error"),
            ErrorKind::Client => Self::new(1, 0.0, 1.0, false, "request rejected by upstream"),
            ErrorKind::Data => Self::new(2, 1.0, 1.5, true, "response could not be parsed"),
            ErrorKind::Validation => Self::new(1, 0.0, 1.0, false, "input failed validation"),
            ErrorKind::Unknown => Self::new(2, 2.0, 2.0, true, "unclassified error"),
        }
    }
}

/// Read-only `ErrorKind -> RetryStrategy` table.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyTable {
    entries: BTreeMap<ErrorKind, RetryStrategy>,
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self {
            entries: ErrorKind::ALL
                .into_iter()
                .map(|k| (k, RetryStrategy::defaults_for(k)))
                .collect(),
        }
    }
}

impl StrategyTable {
    pub fn with(mut self, kind: ErrorKind, strategy: RetryStrategy) -> Self {
        self.entries.insert(kind, strategy);
        self
    }

    /// Lookup falling back to the `unknown` entry.
    pub fn get(&self, kind: ErrorKind) -> &RetryStrategy {
        self.entries
            .get(&kind)
            .or_else(|| self.entries.get(&ErrorKind::Unknown))
            .unwrap_or(&*UNKNOWN_FALLBACK)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ErrorKind, &RetryStrategy)> {
        self.entries.iter()
    }
}

static UNKNOWN_FALLBACK: std::sync::LazyLock<RetryStrategy> =
    std::sync::LazyLock::new(|| RetryStrategy::defaults_for(ErrorKind::Unknown));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_recoverable_kinds_allow_a_single_attempt() {
        let table = StrategyTable::default();
        for kind in [ErrorKind::Auth, ErrorKind::Client, ErrorKind::Validation] {
            let s = table.get(kind);
            assert!(!s.recoverable, "{kind} should not be recoverable");
            assert_eq!(s.max_attempts, 1);
        }
    }

    #[test]
    fn rate_limit_waits_longest_and_network_retries_most() {
        let table = StrategyTable::default();
        let longest = ErrorKind::ALL
            .into_iter()
            .max_by_key(|k| table.get(*k).base_delay)
            .unwrap();
        assert_eq!(longest, ErrorKind::RateLimit);
        let most = ErrorKind::ALL
            .into_iter()
            .max_by_key(|k| table.get(*k).max_attempts)
            .unwrap();
        assert_eq!(most, ErrorKind::Network);
    }
}
