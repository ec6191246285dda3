use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tripwire_core::adaptive::Adaptation;
use tripwire_core::{
    AdaptiveConfig, AdaptiveState, Clock, ErrorClassifier, ErrorKind, RetryConfig, RetryConfigRegistry, RetryRecord,
    RetryStats,
};
use tripwire_store::{Document, StateStore};

use crate::persist;
use crate::retry::decision::{RetryDecision, decide_retry};

/// Adaptive retry policy for one named service.
///
/// Holds the rolling outcome history and the learned attempt ceiling. The
/// retry loops live in [`crate::retry::runner`].
pub struct AdaptiveRetryPolicy {
    service: String,
    state: Mutex<AdaptiveState>,
    classifier: Arc<ErrorClassifier>,
    registry: Arc<RetryConfigRegistry>,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
}

impl AdaptiveRetryPolicy {
    /// Creates the policy, merging in any persisted history for `service`.
    pub fn new(
        service: impl Into<String>,
        config: AdaptiveConfig,
        classifier: Arc<ErrorClassifier>,
        registry: Arc<RetryConfigRegistry>,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let service = service.into();
        let state = match persist::load::<AdaptiveState>(store.as_ref(), Document::RetryHistory, &service) {
            Some(saved) => {
                let s = AdaptiveState::restore(saved, config);
                tracing::debug!(
                    service = %service,
                    samples = s.history.len(),
                    max_attempts = s.current_max_attempts,
                    "restored retry history"
                );
                s
            }
            None => AdaptiveState::new(service.clone(), config),
        };
        Self {
            service,
            state: Mutex::new(state),
            classifier,
            registry,
            store,
            clock,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    /// Adapted ceiling, tightened by the registry's ceiling for this service
    /// and `kind` when smaller.
    pub fn get_max_attempts(&self, kind: Option<ErrorKind>) -> u32 {
        let kind_ceiling = kind.map(|k| self.registry.get(Some(&self.service), Some(k)).max_attempts);
        self.state.lock().max_attempts(kind_ceiling)
    }

    /// Merged retry config for this service and `kind`.
    pub fn retry_config(&self, kind: Option<ErrorKind>) -> RetryConfig {
        self.registry.get(Some(&self.service), kind)
    }

    pub fn calculate_delay(&self, attempt: u32, kind: Option<ErrorKind>) -> Duration {
        tripwire_core::calculate_delay(attempt, &self.retry_config(kind))
    }

    /// Classifies a failed attempt and decides what the loop does next.
    pub fn decide<E: Display + ?Sized>(&self, attempt: u32, error: &E, in_scope: bool) -> RetryDecision {
        let kind = if in_scope {
            self.classifier.classify(error)
        } else {
            ErrorKind::Unknown
        };
        let strategy = self.classifier.strategy(kind);
        decide_retry(
            attempt,
            in_scope,
            kind,
            self.get_max_attempts(Some(kind)),
            strategy.recoverable,
            || self.calculate_delay(attempt, Some(kind)),
        )
    }

    pub fn record_result(&self, attempts: u32, success: bool, error_kind: Option<ErrorKind>, duration: Option<Duration>) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let adaptation = state.record(RetryRecord {
            timestamp: now,
            attempts,
            success,
            error_kind,
            duration,
        });
        self.log_adaptation(adaptation);
        persist::save(self.store.as_ref(), Document::RetryHistory, &self.service, &*state, now);
    }

    /// Forces an adaptation pass regardless of the interval.
    pub fn adapt_max_attempts(&self) -> Option<Adaptation> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let adaptation = state.adapt(now);
        if adaptation.is_some() {
            self.log_adaptation(adaptation);
            persist::save(self.store.as_ref(), Document::RetryHistory, &self.service, &*state, now);
        }
        adaptation
    }

    fn log_adaptation(&self, adaptation: Option<Adaptation>) {
        let Some(a) = adaptation else { return };
        if a.previous != a.current {
            tracing::info!(
                service = %self.service,
                previous = a.previous,
                current = a.current,
                samples = a.samples,
                "adapted max attempts"
            );
        } else {
            tracing::debug!(service = %self.service, max_attempts = a.current, samples = a.samples, "max attempts unchanged");
        }
    }

    pub fn get_stats(&self) -> RetryStats {
        self.state.lock().stats()
    }

    /// Full snapshot, including the raw history window.
    pub fn snapshot(&self) -> AdaptiveState {
        self.state.lock().clone()
    }

    pub fn reset_history(&self) {
        let mut state = self.state.lock();
        state.reset();
        tracing::info!(service = %self.service, "retry history reset");
        persist::save(self.store.as_ref(), Document::RetryHistory, &self.service, &*state, self.clock.now());
    }

    pub(crate) fn reset_unpersisted(&self) {
        self.state.lock().reset();
    }
}

impl std::fmt::Debug for AdaptiveRetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("AdaptiveRetryPolicy")
            .field("service", &self.service)
            .field("current_max_attempts", &state.current_max_attempts)
            .field("samples", &state.history.len())
            .finish()
    }
}
