use std::time::Duration;

use tripwire_core::ErrorKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter { delay: Duration, kind: ErrorKind },
    Stop { reason: StopReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The caller's scope predicate rejected the error.
    OutOfScope,
    NotRetryable(ErrorKind),
    AttemptsExhausted(ErrorKind),
}

impl StopReason {
    /// Kind to record in history; `None` means nothing is recorded.
    pub fn recorded_kind(&self) -> Option<ErrorKind> {
        match self {
            StopReason::OutOfScope => None,
            StopReason::NotRetryable(k) | StopReason::AttemptsExhausted(k) => Some(*k),
        }
    }
}

/// Decide if a failed attempt should be retried and how long to wait.
///
/// - `attempt`: 1-based number of the attempt that just failed.
/// - `in_scope`: result of the caller's scope predicate for this error.
/// - `kind`: classified kind of the error.
/// - `max_attempts`: effective ceiling for `kind`.
/// - `recoverable`: the kind's recoverable flag.
/// - `delay`: backoff for `attempt`, only evaluated when retrying.
pub fn decide_retry(
    attempt: u32,
    in_scope: bool,
    kind: ErrorKind,
    max_attempts: u32,
    recoverable: bool,
    delay: impl FnOnce() -> Duration,
) -> RetryDecision {
    if !in_scope {
        return RetryDecision::Stop {
            reason: StopReason::OutOfScope,
        };
    }
    if !recoverable {
        return RetryDecision::Stop {
            reason: StopReason::NotRetryable(kind),
        };
    }
    if attempt >= max_attempts {
        return RetryDecision::Stop {
            reason: StopReason::AttemptsExhausted(kind),
        };
    }
    RetryDecision::RetryAfter { delay: delay(), kind }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never() -> Duration {
        panic!("delay must not be computed")
    }

    #[test]
    fn out_of_scope_wins_over_everything() {
        let d = decide_retry(1, false, ErrorKind::Network, 5, true, never);
        assert_eq!(
            d,
            RetryDecision::Stop {
                reason: StopReason::OutOfScope
            }
        );
    }

    #[test]
    fn non_recoverable_kind_stops_at_first_failure() {
        let d = decide_retry(1, true, ErrorKind::Auth, 3, false, never);
        assert_eq!(
            d,
            RetryDecision::Stop {
                reason: StopReason::NotRetryable(ErrorKind::Auth)
            }
        );
    }

    #[test]
    fn stops_when_attempt_reaches_ceiling() {
        let d = decide_retry(3, true, ErrorKind::Timeout, 3, true, never);
        assert_eq!(
            d,
            RetryDecision::Stop {
                reason: StopReason::AttemptsExhausted(ErrorKind::Timeout)
            }
        );
        let d = decide_retry(2, true, ErrorKind::Timeout, 3, true, || Duration::from_secs(5));
        assert_eq!(
            d,
            RetryDecision::RetryAfter {
                delay: Duration::from_secs(5),
                kind: ErrorKind::Timeout
            }
        );
    }

    #[test]
    fn recorded_kind_skips_out_of_scope() {
        assert_eq!(StopReason::OutOfScope.recorded_kind(), None);
        assert_eq!(
            StopReason::NotRetryable(ErrorKind::Client).recorded_kind(),
            Some(ErrorKind::Client)
        );
    }
}
