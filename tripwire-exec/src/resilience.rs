use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tripwire_core::{
    AdaptiveState, BreakerState, Clock, ErrorClassifier, ParseError, RetryConfigRegistry, RetryStats, SystemClock,
    TripwireConfig,
};
use tripwire_store::{Document, JsonFileStore, StateStore};

use crate::breaker::CircuitBreaker;
use crate::persist;
use crate::retry::AdaptiveRetryPolicy;
use crate::stats::{CallStats, StatsCollector};

/// State directory used when neither the caller nor the config names one.
pub const DEFAULT_STATE_DIR: &str = "state";

/// Result of a guarded call through [`Resilience::call`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome<T, E> {
    Completed(T),
    /// The retry loop gave up; carries the last attempt's error.
    Failed(E),
    /// The circuit was open; the operation never ran.
    Rejected,
}

impl<T, E> CallOutcome<T, E> {
    pub fn is_rejected(&self) -> bool {
        matches!(self, CallOutcome::Rejected)
    }

    pub fn ok(self) -> Option<T> {
        match self {
            CallOutcome::Completed(v) => Some(v),
            _ => None,
        }
    }
}

/// Owner of every circuit breaker and retry policy in a process.
///
/// Instances are created lazily per name and shared as `Arc`s, so repeated
/// lookups of one name observe the same state.
pub struct Resilience {
    config: TripwireConfig,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    classifier: Arc<ErrorClassifier>,
    registry: Arc<RetryConfigRegistry>,
    breakers: Mutex<BTreeMap<String, Arc<CircuitBreaker>>>,
    policies: Mutex<BTreeMap<String, Arc<AdaptiveRetryPolicy>>>,
    stats: StatsCollector,
}

#[derive(Default)]
pub struct ResilienceBuilder {
    config: TripwireConfig,
    store: Option<Arc<dyn StateStore>>,
    clock: Option<Arc<dyn Clock>>,
    state_dir: Option<PathBuf>,
}

impl ResilienceBuilder {
    pub fn config(mut self, config: TripwireConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Directory for the default file store; wins over `config.state_dir`.
    pub fn state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    /// Fails only when a configured classification pattern is invalid.
    pub fn build(self) -> Result<Resilience, ParseError> {
        let classifier = Arc::new(self.config.classifier()?);
        let registry = Arc::new(self.config.retry_registry());
        let store: Arc<dyn StateStore> = match self.store {
            Some(s) => s,
            None => {
                let dir = self
                    .state_dir
                    .or_else(|| self.config.state_dir.clone())
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));
                Arc::new(JsonFileStore::new(dir))
            }
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(c) => c,
            None => Arc::new(SystemClock),
        };
        Ok(Resilience {
            config: self.config,
            store,
            clock,
            classifier,
            registry,
            breakers: Mutex::new(BTreeMap::new()),
            policies: Mutex::new(BTreeMap::new()),
            stats: StatsCollector::new(),
        })
    }
}

impl Resilience {
    pub fn builder() -> ResilienceBuilder {
        ResilienceBuilder::default()
    }

    pub fn new(config: TripwireConfig) -> Result<Self, ParseError> {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &TripwireConfig {
        &self.config
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    pub fn retry_registry(&self) -> &RetryConfigRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Breaker for `name`, restored from the store on first use.
    pub fn breaker(&self, name: &str) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock();
        if let Some(b) = breakers.get(name) {
            return Arc::clone(b);
        }
        let b = Arc::new(CircuitBreaker::new(
            name,
            self.config.breaker_config(name),
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
        ));
        breakers.insert(name.to_string(), Arc::clone(&b));
        b
    }

    /// Retry policy for `service`, restored from the store on first use.
    pub fn retry_policy(&self, service: &str) -> Arc<AdaptiveRetryPolicy> {
        let mut policies = self.policies.lock();
        if let Some(p) = policies.get(service) {
            return Arc::clone(p);
        }
        let p = Arc::new(AdaptiveRetryPolicy::new(
            service,
            self.config.adaptive_config(service),
            Arc::clone(&self.classifier),
            Arc::clone(&self.registry),
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
        ));
        policies.insert(service.to_string(), Arc::clone(&p));
        p
    }

    /// State of breaker `name` without creating it or writing to the store.
    ///
    /// A breaker that only exists on disk is shown the way a restart would
    /// restore it.
    pub fn breaker_state(&self, name: &str) -> BreakerState {
        let live = self.breakers.lock().get(name).cloned();
        if let Some(b) = live {
            return b.get_state();
        }
        let config = self.config.breaker_config(name);
        let now = self.clock.now();
        match persist::load::<BreakerState>(self.store.as_ref(), Document::CircuitBreakers, name) {
            Some(saved) => BreakerState::restore(saved, config, now).0,
            None => BreakerState::new(name, config, now),
        }
    }

    /// Snapshots of live breakers plus any only present in the store.
    pub fn get_all_states(&self) -> BTreeMap<String, BreakerState> {
        let mut out = BTreeMap::new();
        let now = self.clock.now();
        for (name, value) in self.persisted(Document::CircuitBreakers) {
            match serde_json::from_value::<BreakerState>(value) {
                Ok(saved) => {
                    let config = self.config.breaker_config(&name);
                    out.insert(name, BreakerState::restore(saved, config, now).0);
                }
                Err(e) => tracing::warn!(breaker = %name, error = %e, "skipping unreadable breaker entry"),
            }
        }
        for (name, b) in self.breakers.lock().iter() {
            out.insert(name.clone(), b.get_state());
        }
        out
    }

    /// Closes every live breaker and deletes the persisted document.
    pub fn reset_all(&self) {
        for b in self.breakers.lock().values() {
            b.reset_unpersisted();
        }
        persist::clear(self.store.as_ref(), Document::CircuitBreakers);
        tracing::info!("all circuit breakers reset");
    }

    /// Stats of live policies plus any only present in the store.
    pub fn get_all_stats(&self) -> BTreeMap<String, RetryStats> {
        let mut out = BTreeMap::new();
        for (name, value) in self.persisted(Document::RetryHistory) {
            match serde_json::from_value::<AdaptiveState>(value) {
                Ok(saved) => {
                    let config = self.config.adaptive_config(&name);
                    out.insert(name, AdaptiveState::restore(saved, config).stats());
                }
                Err(e) => tracing::warn!(service = %name, error = %e, "skipping unreadable retry history entry"),
            }
        }
        for (name, p) in self.policies.lock().iter() {
            out.insert(name.clone(), p.get_stats());
        }
        out
    }

    /// Clears every live policy's history and deletes the persisted document.
    pub fn reset_all_history(&self) {
        for p in self.policies.lock().values() {
            p.reset_unpersisted();
        }
        persist::clear(self.store.as_ref(), Document::RetryHistory);
        tracing::info!("all retry history reset");
    }

    fn persisted(&self, doc: Document) -> BTreeMap<String, serde_json::Value> {
        match self.store.load(doc) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(document = %doc, error = %e, "failed to load persisted state");
                BTreeMap::new()
            }
        }
    }

    /// Runs `op` behind the breaker and retry policy named `name`.
    ///
    /// The breaker sees one outcome per call, after the retry loop finishes.
    pub async fn call<T, E, F, Fut>(&self, name: &str, mut op: F) -> CallOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let breaker = self.breaker(name);
        if !breaker.allow_request() {
            self.stats.record_rejected(name);
            return CallOutcome::Rejected;
        }
        let policy = self.retry_policy(name);
        let mut attempts = 0u32;
        let result = policy
            .retry(|| {
                attempts += 1;
                op()
            })
            .await;
        self.settle(name, &breaker, attempts, result)
    }

    /// Blocking twin of [`call`](Self::call).
    pub fn call_blocking<T, E, F>(&self, name: &str, mut op: F) -> CallOutcome<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Display,
    {
        let breaker = self.breaker(name);
        if !breaker.allow_request() {
            self.stats.record_rejected(name);
            return CallOutcome::Rejected;
        }
        let policy = self.retry_policy(name);
        let mut attempts = 0u32;
        let result = policy.retry_blocking(|| {
            attempts += 1;
            op()
        });
        self.settle(name, &breaker, attempts, result)
    }

    fn settle<T, E: Display>(
        &self,
        name: &str,
        breaker: &CircuitBreaker,
        attempts: u32,
        result: Result<T, E>,
    ) -> CallOutcome<T, E> {
        match result {
            Ok(v) => {
                breaker.record_success();
                self.stats.record_success(name, attempts);
                CallOutcome::Completed(v)
            }
            Err(e) => {
                breaker.record_failure();
                self.stats.record_failure(name, attempts, self.classifier.classify(&e));
                CallOutcome::Failed(e)
            }
        }
    }

    pub fn call_stats(&self) -> BTreeMap<String, CallStats> {
        self.stats.snapshot()
    }
}

impl std::fmt::Debug for Resilience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resilience")
            .field("breakers", &self.breakers.lock().keys().collect::<Vec<_>>())
            .field("policies", &self.policies.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}
