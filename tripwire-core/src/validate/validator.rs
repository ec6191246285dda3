use crate::adaptive::AdaptiveConfig;
use crate::breaker::BreakerConfig;
use crate::config::TripwireConfig;
use crate::error::{ValidationError, Violation};
use crate::retry::RetryConfig;

pub struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.violations))
        }
    }

    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    /// Validates every resolved configuration the file can produce, so an
    /// override is checked together with the defaults it lands on.
    pub fn validate_config(&mut self, cfg: &TripwireConfig) {
        self.validate_breaker("circuit_breaker", &cfg.breaker_config(""));
        for name in cfg.circuit_breakers.keys() {
            self.validate_breaker(&format!("circuit_breakers.{name}"), &cfg.breaker_config(name));
        }

        self.validate_adaptive("adaptive", &cfg.adaptive_config(""));
        for name in cfg.adaptive_services.keys() {
            self.validate_adaptive(&format!("adaptive_services.{name}"), &cfg.adaptive_config(name));
        }

        let registry = cfg.retry_registry();
        self.validate_retry("retry", registry.defaults());
        for name in cfg.services.keys() {
            self.validate_retry(&format!("services.{name}"), &registry.get(Some(name), None));
        }
        for kind in cfg.error_kinds.keys() {
            self.validate_retry(&format!("error_kinds.{kind}"), &registry.get(None, Some(*kind)));
        }

        for (kind, patterns) in &cfg.patterns {
            for (i, p) in patterns.iter().enumerate() {
                if let Err(e) = regex::Regex::new(p) {
                    self.push(format!("patterns.{kind}[{i}]"), format!("invalid regex: {e}"));
                }
            }
        }
    }

    fn validate_breaker(&mut self, path: &str, b: &BreakerConfig) {
        if b.failure_threshold == 0 {
            self.push(format!("{path}.failure_threshold"), "must be at least 1");
        }
        if b.half_open_max_calls == 0 {
            self.push(format!("{path}.half_open_max_calls"), "must be at least 1");
        }
    }

    fn validate_adaptive(&mut self, path: &str, a: &AdaptiveConfig) {
        if a.window_size == 0 {
            self.push(format!("{path}.window_size"), "must be at least 1");
        }
        if a.min_attempts == 0 {
            self.push(format!("{path}.min_attempts"), "must be at least 1");
        }
        if a.min_attempts > a.max_attempts {
            self.push(format!("{path}.max_attempts"), "must not be below min_attempts");
        }
        if !(0.0..=1.0).contains(&a.marginal_threshold) {
            self.push(format!("{path}.marginal_threshold"), "must be within [0, 1]");
        }
    }

    fn validate_retry(&mut self, path: &str, r: &RetryConfig) {
        if r.max_attempts == 0 {
            self.push(format!("{path}.max_attempts"), "must be at least 1");
        }
        if !r.backoff_factor.is_finite() || r.backoff_factor <= 0.0 {
            self.push(format!("{path}.backoff_factor"), "must be a positive number");
        }
        if !(0.0..=1.0).contains(&r.jitter) {
            self.push(format!("{path}.jitter"), "must be within [0, 1]");
        }
        if r.base_delay > r.max_delay {
            self.push(format!("{path}.base_delay"), "must not exceed max_delay");
        }
    }
}
