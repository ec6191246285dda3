//! Circuit breaker state machine.
//!
//! - **Closed**: normal operation, every call allowed
//! - **Open**: tripped, calls rejected until `reset_timeout` has passed
//!   since the last failure
//! - **HalfOpen**: probation, up to `half_open_max_calls` probes allowed
//!
//! Everything here is pure: methods take `now` and report the transition
//! they made, leaving persistence and logging to the caller.

use chrono::{DateTime, Utc};

use crate::breaker::config::{BreakerConfig, SuccessDecay};
use crate::clock::elapsed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CircuitState,
    pub to: CircuitState,
}

/// Full breaker state for one resource; also the persisted snapshot.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BreakerState {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    pub half_open_calls: u32,
    #[serde(default)]
    pub last_failure_time: Option<DateTime<Utc>>,
    pub last_state_change: DateTime<Utc>,
    #[serde(flatten)]
    pub config: BreakerConfig,
}

impl BreakerState {
    pub fn new(name: impl Into<String>, config: BreakerConfig, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            half_open_calls: 0,
            last_failure_time: None,
            last_state_change: now,
            config,
        }
    }

    /// Rebuilds state from a persisted snapshot.
    ///
    /// A saved `HalfOpen` comes back as `Open`: probation never resumes
    /// across restarts. A saved `Open` whose reset timeout has already
    /// passed comes back as `HalfOpen`. Thresholds come from `config`, not
    /// from the snapshot.
    pub fn restore(saved: BreakerState, config: BreakerConfig, now: DateTime<Utc>) -> (Self, Option<Transition>) {
        let mut s = BreakerState { config, ..saved };
        let transition = match s.state {
            CircuitState::HalfOpen => s.transition(CircuitState::Open, now),
            CircuitState::Open if s.reset_timeout_elapsed(now) => {
                s.transition(CircuitState::HalfOpen, now)
            }
            _ => None,
        };
        (s, transition)
    }

    fn reset_timeout_elapsed(&self, now: DateTime<Utc>) -> bool {
        match self.last_failure_time {
            Some(t) => elapsed(now, t) > self.config.reset_timeout,
            None => true,
        }
    }

    fn transition(&mut self, to: CircuitState, now: DateTime<Utc>) -> Option<Transition> {
        let from = self.state;
        self.state = to;
        self.half_open_calls = 0;
        if from != to {
            self.last_state_change = now;
        }
        match to {
            CircuitState::HalfOpen => self.success_count = 0,
            CircuitState::Closed => {
                self.failure_count = 0;
                self.success_count = 0;
            }
            CircuitState::Open => {}
        }
        (from != to).then_some(Transition { from, to })
    }

    /// Whether a call may proceed. An `Open` breaker past its reset timeout
    /// moves to `HalfOpen` here, on read.
    pub fn allow_request(&mut self, now: DateTime<Utc>) -> (bool, Option<Transition>) {
        match self.state {
            CircuitState::Closed => (true, None),
            CircuitState::Open => {
                if self.reset_timeout_elapsed(now) {
                    (true, self.transition(CircuitState::HalfOpen, now))
                } else {
                    (false, None)
                }
            }
            CircuitState::HalfOpen => (self.half_open_calls < self.config.half_open_max_calls, None),
        }
    }

    pub fn record_success(&mut self, now: DateTime<Utc>) -> Option<Transition> {
        self.success_count = self.success_count.saturating_add(1);
        self.failure_count = match self.config.success_decay {
            SuccessDecay::Decrement => self.failure_count.saturating_sub(1),
            SuccessDecay::Reset => 0,
        };
        if self.state == CircuitState::HalfOpen {
            self.half_open_calls = self.half_open_calls.saturating_add(1);
            if self.success_count >= self.config.half_open_max_calls {
                return self.transition(CircuitState::Closed, now);
            }
        }
        None
    }

    pub fn record_failure(&mut self, now: DateTime<Utc>) -> Option<Transition> {
        self.failure_count = self.failure_count.saturating_add(1);
        self.success_count = 0;
        self.last_failure_time = Some(now);
        match self.state {
            CircuitState::Closed if self.failure_count >= self.config.failure_threshold => {
                self.transition(CircuitState::Open, now)
            }
            CircuitState::HalfOpen => self.transition(CircuitState::Open, now),
            _ => None,
        }
    }

    /// Back to `Closed` with every counter cleared.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Option<Transition> {
        let t = self.transition(CircuitState::Closed, now);
        self.last_failure_time = None;
        t
    }
}
