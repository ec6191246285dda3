use std::time::Duration;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AdaptiveConfig {
    pub window_size: usize,
    pub min_attempts: u32,
    /// Hard ceiling the adapted value may explore up to.
    pub max_attempts: u32,
    /// Live ceiling for a fresh or reset service.
    pub initial_max_attempts: u32,
    #[serde(with = "crate::secs")]
    pub adaptation_interval: Duration,
    /// Records required before adaptation runs.
    pub min_samples: usize,
    /// Marginal success rate an extra attempt must reach to be kept.
    pub marginal_threshold: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            window_size: 100,
            min_attempts: 1,
            max_attempts: 5,
            initial_max_attempts: 3,
            adaptation_interval: Duration::from_secs(3600),
            min_samples: 10,
            marginal_threshold: 0.05,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdaptiveOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_max_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::secs::option")]
    pub adaptation_interval: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_samples: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marginal_threshold: Option<f64>,
}

impl AdaptiveOverride {
    pub fn apply_to(&self, cfg: &mut AdaptiveConfig) {
        if let Some(v) = self.window_size {
            cfg.window_size = v;
        }
        if let Some(v) = self.min_attempts {
            cfg.min_attempts = v;
        }
        if let Some(v) = self.max_attempts {
            cfg.max_attempts = v;
        }
        if let Some(v) = self.initial_max_attempts {
            cfg.initial_max_attempts = v;
        }
        if let Some(v) = self.adaptation_interval {
            cfg.adaptation_interval = v;
        }
        if let Some(v) = self.min_samples {
            cfg.min_samples = v;
        }
        if let Some(v) = self.marginal_threshold {
            cfg.marginal_threshold = v;
        }
    }
}
