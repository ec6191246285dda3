#![forbid(unsafe_code)]

//! Stateful resilience runtime: persisted circuit breakers, adaptive retry
//! policies and the [`Resilience`] registry that owns them.
//!
//! State machines and configuration live in `tripwire-core`; this crate adds
//! locking, persistence through a `tripwire-store` backend, and the retry
//! loops.

pub mod breaker;
mod persist;
pub mod resilience;
pub mod retry;
pub mod stats;

pub use crate::breaker::CircuitBreaker;
pub use crate::resilience::{CallOutcome, DEFAULT_STATE_DIR, Resilience, ResilienceBuilder};
pub use crate::retry::{AdaptiveRetryPolicy, RetryDecision, StopReason, decide_retry};
pub use crate::stats::{CallStats, StatsCollector};
