mod config;
mod state;

pub use config::{AdaptiveConfig, AdaptiveOverride};
pub use state::{Adaptation, AdaptiveState, RetryRecord, RetryStats, compute_ceiling};
