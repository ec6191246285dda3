mod backoff;
mod config;
mod registry;

pub use backoff::{calculate_delay, calculate_delay_with};
pub use config::{RetryConfig, RetryOverride};
pub use registry::RetryConfigRegistry;
