//! Retry policy and per-year attempt state machine.
//!
//! Each attempt's outcome is classified, then fed to [`RetryState::step`]
//! which decides between finishing, waiting out a rate limit, backing off,
//! or aborting:
//!
//! ```text
//! Attempting ─┬─ 200 ───────────────────────────────▶ Done
//!             ├─ 429 ──▶ WaitAndRetry(Retry-After) ──▶ Attempting (same attempt)
//!             ├─ other status / network ─▶ BackoffAndRetry ─▶ Attempting (next attempt)
//!             └─ budget spent / unbuildable request ─▶ Aborted
//! ```

use super::provider::FetchError;
use super::transport::{HttpResponse, TransportError};
use std::time::Duration;

/// Which backoff curve a retryable failure uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffKind {
    /// Non-200, non-429 HTTP status.
    Status,
    /// Timeout or connection-level failure.
    Network,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per year, counting the first. Rate-limit waits do not count.
    pub max_attempts: u32,
    pub status_backoff_base: Duration,
    pub network_backoff_base: Duration,
    /// Used when a 429 has no parsable `Retry-After`.
    pub default_retry_after: Duration,
    /// Consecutive 429s tolerated before the year is abandoned.
    pub max_rate_limit_waits: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            status_backoff_base: Duration::from_secs(1),
            network_backoff_base: Duration::from_secs(5),
            default_retry_after: Duration::from_secs(60),
            max_rate_limit_waits: 10,
        }
    }
}

/// What a single attempt amounted to.
#[derive(Debug)]
pub enum Classification {
    Success(String),
    RateLimited { retry_after: Duration },
    Retryable { error: FetchError, kind: BackoffKind },
    Fatal(FetchError),
}

impl RetryPolicy {
    /// Delay after the failed attempt with zero-based index `attempt`.
    pub fn backoff(&self, kind: BackoffKind, attempt: u32) -> Duration {
        let base = match kind {
            BackoffKind::Status => self.status_backoff_base,
            BackoffKind::Network => self.network_backoff_base,
        };
        base.saturating_mul(2u32.saturating_pow(attempt))
    }

    pub fn classify(&self, outcome: Result<HttpResponse, TransportError>) -> Classification {
        match outcome {
            Ok(resp) if resp.status == 200 => Classification::Success(resp.body),
            Ok(resp) if resp.status == 429 => Classification::RateLimited {
                retry_after: self.parse_retry_after(resp.retry_after.as_deref()),
            },
            Ok(resp) => Classification::Retryable {
                error: FetchError::TransientServerError {
                    status: resp.status,
                },
                kind: BackoffKind::Status,
            },
            Err(TransportError::Timeout(msg)) => Classification::Retryable {
                error: FetchError::NetworkTimeout(msg),
                kind: BackoffKind::Network,
            },
            Err(TransportError::Network(msg)) => Classification::Retryable {
                error: FetchError::NetworkError(msg),
                kind: BackoffKind::Network,
            },
            Err(TransportError::InvalidRequest(msg)) => {
                Classification::Fatal(FetchError::InvalidRequest(msg))
            }
        }
    }

    /// `Retry-After` in delta-seconds; HTTP-date values fall back to the default.
    fn parse_retry_after(&self, value: Option<&str>) -> Duration {
        value
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.default_retry_after)
    }
}

/// Transition out of `Attempting`.
#[derive(Debug)]
pub enum Step {
    Done(String),
    WaitAndRetry { delay: Duration },
    BackoffAndRetry { delay: Duration, cause: FetchError },
    Aborted(FetchError),
}

/// Attempt bookkeeping for one year.
#[derive(Debug)]
pub struct RetryState<'a> {
    policy: &'a RetryPolicy,
    year: i32,
    attempt: u32,
    rate_limit_waits: u32,
}

impl<'a> RetryState<'a> {
    pub fn new(policy: &'a RetryPolicy, year: i32) -> Self {
        Self {
            policy,
            year,
            attempt: 0,
            rate_limit_waits: 0,
        }
    }

    /// Zero-based index of the attempt about to be made.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn step(&mut self, classification: Classification) -> Step {
        match classification {
            Classification::Success(body) => Step::Done(body),
            Classification::RateLimited { retry_after } => {
                if self.rate_limit_waits >= self.policy.max_rate_limit_waits {
                    return Step::Aborted(FetchError::RateLimited {
                        year: self.year,
                        retry_after_secs: retry_after.as_secs(),
                        waits: self.rate_limit_waits,
                    });
                }
                self.rate_limit_waits += 1;
                Step::WaitAndRetry { delay: retry_after }
            }
            Classification::Retryable { error, kind } => {
                self.rate_limit_waits = 0;
                let failed = self.attempt;
                if failed + 1 < self.policy.max_attempts {
                    self.attempt += 1;
                    Step::BackoffAndRetry {
                        delay: self.policy.backoff(kind, failed),
                        cause: error,
                    }
                } else {
                    Step::Aborted(FetchError::RetriesExhausted {
                        year: self.year,
                        attempts: self.policy.max_attempts,
                        last: Box::new(error),
                    })
                }
            }
            Classification::Fatal(error) => Step::Aborted(error),
        }
    }
}

/// Blocking wait between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Sleeps the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn status_backoff_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(BackoffKind::Status, 0), secs(1));
        assert_eq!(policy.backoff(BackoffKind::Status, 1), secs(2));
        assert_eq!(policy.backoff(BackoffKind::Status, 2), secs(4));
    }

    #[test]
    fn network_backoff_doubles_from_five_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(BackoffKind::Network, 0), secs(5));
        assert_eq!(policy.backoff(BackoffKind::Network, 1), secs(10));
        assert_eq!(policy.backoff(BackoffKind::Network, 2), secs(20));
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.backoff(BackoffKind::Network, 200),
            secs(5).saturating_mul(u32::MAX)
        );
    }

    #[test]
    fn classify_reads_retry_after_seconds() {
        let policy = RetryPolicy::default();
        match policy.classify(Ok(HttpResponse::rate_limited(Some("5")))) {
            Classification::RateLimited { retry_after } => assert_eq!(retry_after, secs(5)),
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[test]
    fn classify_defaults_missing_or_dated_retry_after() {
        let policy = RetryPolicy::default();
        for header in [None, Some("Wed, 21 Oct 2015 07:28:00 GMT")] {
            match policy.classify(Ok(HttpResponse::rate_limited(header))) {
                Classification::RateLimited { retry_after } => {
                    assert_eq!(retry_after, secs(60))
                }
                other => panic!("expected rate limit, got {other:?}"),
            }
        }
    }

    #[test]
    fn classify_maps_transport_errors() {
        let policy = RetryPolicy::default();
        assert!(matches!(
            policy.classify(Err(TransportError::Timeout("read".into()))),
            Classification::Retryable {
                error: FetchError::NetworkTimeout(_),
                kind: BackoffKind::Network
            }
        ));
        assert!(matches!(
            policy.classify(Err(TransportError::Network("reset".into()))),
            Classification::Retryable {
                error: FetchError::NetworkError(_),
                kind: BackoffKind::Network
            }
        ));
        assert!(matches!(
            policy.classify(Err(TransportError::InvalidRequest("bad url".into()))),
            Classification::Fatal(FetchError::InvalidRequest(_))
        ));
        assert!(matches!(
            policy.classify(Ok(HttpResponse::status(502))),
            Classification::Retryable {
                error: FetchError::TransientServerError { status: 502 },
                kind: BackoffKind::Status
            }
        ));
    }

    #[test]
    fn three_server_errors_exhaust_the_budget() {
        let policy = RetryPolicy::default();
        let mut state = RetryState::new(&policy, 2024);
        let server_error = || policy.classify(Ok(HttpResponse::status(500)));

        assert!(matches!(
            state.step(server_error()),
            Step::BackoffAndRetry { delay, .. } if delay == secs(1)
        ));
        assert!(matches!(
            state.step(server_error()),
            Step::BackoffAndRetry { delay, .. } if delay == secs(2)
        ));
        match state.step(server_error()) {
            Step::Aborted(FetchError::RetriesExhausted {
                year,
                attempts,
                last,
            }) => {
                assert_eq!(year, 2024);
                assert_eq!(attempts, 3);
                assert!(matches!(*last, FetchError::TransientServerError { status: 500 }));
            }
            other => panic!("expected abort, got {other:?}"),
        }
    }

    #[test]
    fn rate_limit_does_not_consume_an_attempt() {
        let policy = RetryPolicy::default();
        let mut state = RetryState::new(&policy, 2023);

        state.step(policy.classify(Ok(HttpResponse::status(500))));
        assert_eq!(state.attempt(), 1);

        assert!(matches!(
            state.step(policy.classify(Ok(HttpResponse::rate_limited(Some("5"))))),
            Step::WaitAndRetry { delay } if delay == secs(5)
        ));
        assert_eq!(state.attempt(), 1);

        // Still one backoff left before the budget is spent.
        assert!(matches!(
            state.step(policy.classify(Ok(HttpResponse::status(500)))),
            Step::BackoffAndRetry { .. }
        ));
        assert!(matches!(
            state.step(policy.classify(Ok(HttpResponse::ok("H\nA")))),
            Step::Done(body) if body == "H\nA"
        ));
    }

    #[test]
    fn endless_rate_limiting_is_capped() {
        let policy = RetryPolicy {
            max_rate_limit_waits: 2,
            ..RetryPolicy::default()
        };
        let mut state = RetryState::new(&policy, 2025);
        let limited = || policy.classify(Ok(HttpResponse::rate_limited(Some("1"))));

        assert!(matches!(state.step(limited()), Step::WaitAndRetry { .. }));
        assert!(matches!(state.step(limited()), Step::WaitAndRetry { .. }));
        assert!(matches!(
            state.step(limited()),
            Step::Aborted(FetchError::RateLimited { year: 2025, waits: 2, .. })
        ));
    }

    #[test]
    fn fatal_aborts_without_retry() {
        let policy = RetryPolicy::default();
        let mut state = RetryState::new(&policy, 2024);
        assert!(matches!(
            state.step(policy.classify(Err(TransportError::InvalidRequest("x".into())))),
            Step::Aborted(FetchError::InvalidRequest(_))
        ));
        assert_eq!(state.attempt(), 0);
    }
}
