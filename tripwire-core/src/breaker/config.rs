use std::time::Duration;

/// How a success in any state treats the accumulated failure count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessDecay {
    /// Subtract one failure per success, floored at zero.
    #[default]
    Decrement,
    /// Forget all failures on the first success.
    Reset,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    #[serde(with = "crate::secs")]
    pub reset_timeout: Duration,
    pub half_open_max_calls: u32,
    #[serde(default)]
    pub success_decay: SuccessDecay,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(300),
            half_open_max_calls: 3,
            success_decay: SuccessDecay::Decrement,
        }
    }
}

/// Partial [`BreakerConfig`] used for per-resource settings.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::secs::option")]
    pub reset_timeout: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_open_max_calls: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_decay: Option<SuccessDecay>,
}

impl BreakerOverride {
    pub fn apply_to(&self, cfg: &mut BreakerConfig) {
        if let Some(v) = self.failure_threshold {
            cfg.failure_threshold = v;
        }
        if let Some(v) = self.reset_timeout {
            cfg.reset_timeout = v;
        }
        if let Some(v) = self.half_open_max_calls {
            cfg.half_open_max_calls = v;
        }
        if let Some(v) = self.success_decay {
            cfg.success_decay = v;
        }
    }
}
