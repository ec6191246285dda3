//! Attempt loops driving an [`AdaptiveRetryPolicy`].
//!
//! Both loops return the last attempt's error unchanged. The policy lock is
//! only taken between attempts, never across a sleep or an `.await`.

use std::fmt::Display;
use std::future::Future;

use crate::retry::decision::RetryDecision;
use crate::retry::policy::AdaptiveRetryPolicy;

impl AdaptiveRetryPolicy {
    /// Runs `op` until it succeeds or the policy gives up.
    pub async fn retry<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.retry_when(op, |_| true).await
    }

    /// Like [`retry`](Self::retry), but an error for which `in_scope` returns
    /// `false` is returned at once, without a history record or a sleep.
    pub async fn retry_when<T, E, F, Fut, P>(&self, mut op: F, in_scope: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let started = tokio::time::Instant::now();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match op().await {
                Ok(v) => {
                    self.record_result(attempt, true, None, Some(started.elapsed()));
                    return Ok(v);
                }
                Err(e) => e,
            };
            match self.decide(attempt, &err, in_scope(&err)) {
                RetryDecision::RetryAfter { delay, kind } => {
                    tracing::debug!(
                        service = %self.service(),
                        attempt,
                        kind = %kind,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::Stop { reason } => {
                    if let Some(kind) = reason.recorded_kind() {
                        tracing::debug!(service = %self.service(), attempt, kind = %kind, error = %err, "giving up");
                        self.record_result(attempt, false, Some(kind), Some(started.elapsed()));
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Blocking twin of [`retry`](Self::retry); sleeps the current thread.
    pub fn retry_blocking<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Display,
    {
        self.retry_blocking_when(op, |_| true)
    }

    pub fn retry_blocking_when<T, E, F, P>(&self, mut op: F, in_scope: P) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let started = std::time::Instant::now();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match op() {
                Ok(v) => {
                    self.record_result(attempt, true, None, Some(started.elapsed()));
                    return Ok(v);
                }
                Err(e) => e,
            };
            match self.decide(attempt, &err, in_scope(&err)) {
                RetryDecision::RetryAfter { delay, kind } => {
                    tracing::debug!(
                        service = %self.service(),
                        attempt,
                        kind = %kind,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "attempt failed, retrying"
                    );
                    std::thread::sleep(delay);
                }
                RetryDecision::Stop { reason } => {
                    if let Some(kind) = reason.recorded_kind() {
                        tracing::debug!(service = %self.service(), attempt, kind = %kind, error = %err, "giving up");
                        self.record_result(attempt, false, Some(kind), Some(started.elapsed()));
                    }
                    return Err(err);
                }
            }
        }
    }
}
