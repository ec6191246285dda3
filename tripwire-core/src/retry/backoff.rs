use std::time::Duration;

use crate::retry::config::RetryConfig;

/// Exponential backoff with symmetric jitter, capped at `max_delay`.
///
/// `attempt` is 1-based: the delay after the first failed attempt is
/// `base_delay`.
pub fn calculate_delay(attempt: u32, cfg: &RetryConfig) -> Duration {
    calculate_delay_with(attempt, cfg, fastrand::f64())
}

/// Same as [`calculate_delay`] with an explicit uniform sample in `[0, 1)`.
pub fn calculate_delay_with(attempt: u32, cfg: &RetryConfig, sample: f64) -> Duration {
    let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
    let raw = cfg.base_delay.as_secs_f64() * cfg.backoff_factor.powi(exp);
    let spread = cfg.jitter * (2.0 * sample - 1.0);
    let jittered = raw * (1.0 + spread);
    let capped = jittered.min(cfg.max_delay.as_secs_f64()).max(0.0);
    crate::secs::from_f64(capped)
}
