use std::sync::Arc;

use parking_lot::Mutex;
use tripwire_core::{BreakerConfig, BreakerState, CircuitState, Clock, Transition};
use tripwire_store::{Document, StateStore};

use crate::persist;

/// Circuit breaker for one named resource.
///
/// State changes, persistence and logging happen under one lock per
/// instance, so concurrent callers never lose a counter update.
pub struct CircuitBreaker {
    name: String,
    state: Mutex<BreakerState>,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
}

impl CircuitBreaker {
    /// Creates the breaker, restoring any persisted state for `name`.
    pub fn new(
        name: impl Into<String>,
        config: BreakerConfig,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let name = name.into();
        let now = clock.now();
        let (state, transition) = match persist::load::<BreakerState>(store.as_ref(), Document::CircuitBreakers, &name) {
            Some(saved) => BreakerState::restore(saved, config, now),
            None => (BreakerState::new(name.clone(), config, now), None),
        };
        let breaker = Self {
            name,
            state: Mutex::new(state),
            store,
            clock,
        };
        if let Some(t) = transition {
            tracing::info!(breaker = %breaker.name, from = %t.from, to = %t.to, "circuit breaker state adjusted on load");
            breaker.persist(&breaker.state.lock());
        }
        breaker
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn persist(&self, state: &BreakerState) {
        persist::save(self.store.as_ref(), Document::CircuitBreakers, &self.name, state, self.clock.now());
    }

    fn log_transition(&self, t: Option<Transition>, state: &BreakerState) {
        let Some(t) = t else { return };
        match t.to {
            CircuitState::Open => tracing::warn!(
                breaker = %self.name,
                from = %t.from,
                failures = state.failure_count,
                "circuit breaker opened"
            ),
            _ => tracing::info!(breaker = %self.name, from = %t.from, to = %t.to, "circuit breaker state change"),
        }
    }

    /// `false` means the caller must skip the call; nothing is raised.
    pub fn allow_request(&self) -> bool {
        let mut state = self.state.lock();
        let (allowed, transition) = state.allow_request(self.clock.now());
        if transition.is_some() {
            self.log_transition(transition, &state);
            self.persist(&state);
        }
        if !allowed {
            tracing::debug!(breaker = %self.name, state = %state.state, "request rejected by circuit breaker");
        }
        allowed
    }

    pub fn record_success(&self) {
        let mut state = self.state.lock();
        let transition = state.record_success(self.clock.now());
        self.log_transition(transition, &state);
        self.persist(&state);
    }

    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        let transition = state.record_failure(self.clock.now());
        self.log_transition(transition, &state);
        self.persist(&state);
    }

    pub fn reset(&self) {
        let mut state = self.state.lock();
        let transition = state.reset(self.clock.now());
        self.log_transition(transition, &state);
        self.persist(&state);
    }

    /// Resets in memory only; used when the whole store is being cleared.
    pub(crate) fn reset_unpersisted(&self) {
        let mut state = self.state.lock();
        let transition = state.reset(self.clock.now());
        self.log_transition(transition, &state);
    }

    pub fn get_state(&self) -> BreakerState {
        self.state.lock().clone()
    }

    pub fn state(&self) -> CircuitState {
        self.state.lock().state
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &*self.state.lock())
            .finish()
    }
}
