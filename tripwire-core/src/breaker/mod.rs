mod config;
mod state;

pub use config::{BreakerConfig, BreakerOverride, SuccessDecay};
pub use state::{BreakerState, CircuitState, Transition};
