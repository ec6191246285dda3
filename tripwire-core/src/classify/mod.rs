mod classifier;
mod patterns;
mod strategy;

pub use classifier::{ErrorClassifier, Subject};
pub use strategy::{RetryStrategy, StrategyTable};
