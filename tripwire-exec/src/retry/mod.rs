mod decision;
mod policy;
mod runner;

pub use decision::{RetryDecision, StopReason, decide_retry};
pub use policy::AdaptiveRetryPolicy;
