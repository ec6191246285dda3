use std::time::Duration;

/// Concrete retry knobs for one (service, error kind) pair.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    #[serde(with = "crate::secs")]
    pub base_delay: Duration,
    pub backoff_factor: f64,
    /// Symmetric multiplicative jitter; 0.5 means ±50%.
    pub jitter: f64,
    #[serde(with = "crate::secs")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
            jitter: 0.5,
            max_delay: Duration::from_secs(60),
        }
    }
}

/// Partial [`RetryConfig`]; unset fields keep the value underneath.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::secs::option")]
    pub base_delay: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::secs::option")]
    pub max_delay: Option<Duration>,
}

impl RetryOverride {
    pub fn apply_to(&self, cfg: &mut RetryConfig) {
        if let Some(v) = self.max_attempts {
            cfg.max_attempts = v;
        }
        if let Some(v) = self.base_delay {
            cfg.base_delay = v;
        }
        if let Some(v) = self.backoff_factor {
            cfg.backoff_factor = v;
        }
        if let Some(v) = self.jitter {
            cfg.jitter = v;
        }
        if let Some(v) = self.max_delay {
            cfg.max_delay = v;
        }
    }

    /// Layers `other` on top of `self`.
    pub fn merged(&self, other: &RetryOverride) -> RetryOverride {
        RetryOverride {
            max_attempts: other.max_attempts.or(self.max_attempts),
            base_delay: other.base_delay.or(self.base_delay),
            backoff_factor: other.backoff_factor.or(self.backoff_factor),
            jitter: other.jitter.or(self.jitter),
            max_delay: other.max_delay.or(self.max_delay),
        }
    }
}
