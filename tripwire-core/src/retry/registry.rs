use std::collections::BTreeMap;
use std::time::Duration;

use crate::classify::StrategyTable;
use crate::kind::ErrorKind;
use crate::retry::config::{RetryConfig, RetryOverride};

/// Static retry configuration lookup.
///
/// Resolution order, later layers winning: defaults, per-service overrides,
/// per-error-kind overrides. The kind of failure outranks which service
/// failed.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfigRegistry {
    defaults: RetryConfig,
    services: BTreeMap<String, RetryOverride>,
    error_kinds: BTreeMap<ErrorKind, RetryOverride>,
}

impl Default for RetryConfigRegistry {
    fn default() -> Self {
        Self::from_strategies(&StrategyTable::default())
    }
}

impl RetryConfigRegistry {
    /// Built-in service table plus per-kind overrides seeded from `strategies`.
    pub fn from_strategies(strategies: &StrategyTable) -> Self {
        let error_kinds = strategies
            .iter()
            .map(|(kind, s)| {
                (
                    *kind,
                    RetryOverride {
                        max_attempts: Some(s.max_attempts),
                        base_delay: Some(s.base_delay),
                        backoff_factor: Some(s.backoff_factor),
                        ..Default::default()
                    },
                )
            })
            .collect();
        Self {
            defaults: RetryConfig::default(),
            services: builtin_services(),
            error_kinds,
        }
    }

    /// A registry with no service or kind overrides.
    pub fn empty(defaults: RetryConfig) -> Self {
        Self {
            defaults,
            services: BTreeMap::new(),
            error_kinds: BTreeMap::new(),
        }
    }

    pub fn with_defaults(mut self, over: &RetryOverride) -> Self {
        over.apply_to(&mut self.defaults);
        self
    }

    /// Merges `over` into any existing override for `service`.
    pub fn with_service(mut self, service: impl Into<String>, over: RetryOverride) -> Self {
        let entry = self.services.entry(service.into()).or_default();
        *entry = entry.merged(&over);
        self
    }

    pub fn with_error_kind(mut self, kind: ErrorKind, over: RetryOverride) -> Self {
        let entry = self.error_kinds.entry(kind).or_default();
        *entry = entry.merged(&over);
        self
    }

    pub fn defaults(&self) -> &RetryConfig {
        &self.defaults
    }

    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn get(&self, service: Option<&str>, kind: Option<ErrorKind>) -> RetryConfig {
        let mut cfg = self.defaults.clone();
        if let Some(over) = service.and_then(|s| self.services.get(s)) {
            over.apply_to(&mut cfg);
        }
        if let Some(over) = kind.and_then(|k| self.error_kinds.get(&k)) {
            over.apply_to(&mut cfg);
        }
        cfg
    }
}

fn builtin_services() -> BTreeMap<String, RetryOverride> {
    let mut m = BTreeMap::new();
    m.insert(
        "yahoo_finance".to_string(),
        RetryOverride {
            max_attempts: Some(3),
            base_delay: Some(Duration::from_secs(2)),
            max_delay: Some(Duration::from_secs(30)),
            ..Default::default()
        },
    );
    m.insert(
        "line_notify".to_string(),
        RetryOverride {
            max_attempts: Some(3),
            base_delay: Some(Duration::from_secs(1)),
            max_delay: Some(Duration::from_secs(15)),
            ..Default::default()
        },
    );
    m.insert(
        "twse".to_string(),
        RetryOverride {
            max_attempts: Some(5),
            base_delay: Some(Duration::from_secs(3)),
            backoff_factor: Some(1.5),
            ..Default::default()
        },
    );
    m
}
