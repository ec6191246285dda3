mod parser;

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::adaptive::{AdaptiveConfig, AdaptiveOverride};
use crate::breaker::{BreakerConfig, BreakerOverride};
use crate::classify::{ErrorClassifier, RetryStrategy, StrategyTable};
use crate::error::ParseError;
use crate::kind::ErrorKind;
use crate::retry::{RetryConfigRegistry, RetryOverride};

pub use parser::{ConfigFormat, load_config, parse_config_str};

/// On-disk tripwire configuration. Every section is optional; anything left
/// out keeps the built-in defaults.
///
/// ```yaml
/// state_dir: /var/lib/stockbot/state
/// circuit_breaker:
///   failure_threshold: 5
///   reset_timeout: 300
/// circuit_breakers:
///   line_notify:
///     failure_threshold: 3
/// adaptive:
///   window_size: 200
/// services:
///   twse:
///     max_attempts: 4
/// error_kinds:
///   rate_limit:
///     base_delay: 60
/// patterns:
///   data:
///     - "unexpected schema"
/// ```
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TripwireConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    pub circuit_breaker: BreakerOverride,
    pub circuit_breakers: BTreeMap<String, BreakerOverride>,
    pub adaptive: AdaptiveOverride,
    pub adaptive_services: BTreeMap<String, AdaptiveOverride>,
    pub retry: RetryOverride,
    pub services: BTreeMap<String, RetryOverride>,
    pub error_kinds: BTreeMap<ErrorKind, RetryOverride>,
    pub patterns: BTreeMap<ErrorKind, Vec<String>>,
}

impl TripwireConfig {
    pub fn breaker_config(&self, name: &str) -> BreakerConfig {
        let mut cfg = BreakerConfig::default();
        self.circuit_breaker.apply_to(&mut cfg);
        if let Some(over) = self.circuit_breakers.get(name) {
            over.apply_to(&mut cfg);
        }
        cfg
    }

    /// Adaptive settings for `service`. The exploration ceiling starts from
    /// the service's resolved retry `max_attempts`; `adaptive` sections win.
    pub fn adaptive_config(&self, service: &str) -> AdaptiveConfig {
        let mut cfg = AdaptiveConfig {
            max_attempts: self.retry_registry().get(Some(service), None).max_attempts,
            ..Default::default()
        };
        self.adaptive.apply_to(&mut cfg);
        if let Some(over) = self.adaptive_services.get(service) {
            over.apply_to(&mut cfg);
        }
        cfg
    }

    /// Built-in strategy table with `error_kinds` applied.
    pub fn strategies(&self) -> StrategyTable {
        let mut table = StrategyTable::default();
        for (kind, over) in &self.error_kinds {
            let base = table.get(*kind);
            let strategy = RetryStrategy {
                max_attempts: over.max_attempts.unwrap_or(base.max_attempts),
                base_delay: over.base_delay.unwrap_or(base.base_delay),
                backoff_factor: over.backoff_factor.unwrap_or(base.backoff_factor),
                ..base.clone()
            };
            table = table.with(*kind, strategy);
        }
        table
    }

    pub fn retry_registry(&self) -> RetryConfigRegistry {
        let mut reg = RetryConfigRegistry::from_strategies(&self.strategies()).with_defaults(&self.retry);
        for (service, over) in &self.services {
            reg = reg.with_service(service.clone(), over.clone());
        }
        for (kind, over) in &self.error_kinds {
            reg = reg.with_error_kind(*kind, over.clone());
        }
        reg
    }

    pub fn classifier(&self) -> Result<ErrorClassifier, ParseError> {
        let mut c = ErrorClassifier::new(self.strategies());
        for (kind, patterns) in &self.patterns {
            for p in patterns {
                c = c.with_pattern(*kind, p)?;
            }
        }
        Ok(c)
    }
}
