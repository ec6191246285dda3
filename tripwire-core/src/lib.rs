#![forbid(unsafe_code)]

//! Pure resilience logic: error classification, retry configuration, and the
//! circuit-breaker and adaptive-retry state machines. Nothing in this crate
//! performs I/O besides reading a config file on request.

pub mod adaptive;
pub mod breaker;
pub mod classify;
pub mod clock;
pub mod config;
pub mod error;
pub mod kind;
pub mod retry;
pub mod secs;
pub mod validate;

pub use crate::adaptive::{AdaptiveConfig, AdaptiveState, RetryRecord, RetryStats};
pub use crate::breaker::{BreakerConfig, BreakerState, CircuitState, SuccessDecay, Transition};
pub use crate::classify::{ErrorClassifier, RetryStrategy, StrategyTable, Subject};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::{ConfigFormat, TripwireConfig, load_config, parse_config_str};
pub use crate::error::{ConfigError, ParseError, ValidationError, Violation};
pub use crate::kind::ErrorKind;
pub use crate::retry::{RetryConfig, RetryConfigRegistry, RetryOverride, calculate_delay};
pub use crate::validate::{Validate, validate_config};
