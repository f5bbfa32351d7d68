//! APG transparency platform provider.
//!
//! Downloads EXAA day-ahead prices (15-minute resolution) as CSV, one request
//! per year. Handles rate limiting, retries with exponential backoff, and
//! aborts the year once the retry budget is spent.

use super::provider::{DownloadProgress, DownloadResult, FetchError, PriceProvider};
use super::retry::{RetryPolicy, RetryState, Sleeper, Step, ThreadSleeper};
use super::transport::Transport;
use super::year_range::YearRange;
use tracing::{debug, error, warn};

/// Endpoint template; `{start}` and `{end}` take `YYYY-MM-DDT000000` values.
pub const DEFAULT_ENDPOINT: &str =
    "https://transparency.apg.at/api/v1/EXAAD1P/Download/de/PT15M/{start}/{end}";

/// APG day-ahead price provider.
pub struct ApgProvider<T, S = ThreadSleeper> {
    transport: T,
    sleeper: S,
    endpoint: String,
    policy: RetryPolicy,
}

impl<T: Transport> ApgProvider<T> {
    pub fn new(transport: T, endpoint: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper: ThreadSleeper,
            endpoint: endpoint.into(),
            policy,
        }
    }
}

impl<T: Transport, S: Sleeper> ApgProvider<T, S> {
    /// Replace how the provider waits between attempts.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> ApgProvider<T, S2> {
        ApgProvider {
            transport: self.transport,
            sleeper,
            endpoint: self.endpoint,
            policy: self.policy,
        }
    }

    /// Build the download URL for a year's range.
    pub fn request_url(&self, range: &YearRange) -> String {
        request_url(&self.endpoint, range)
    }

    /// Run the retry state machine for one year.
    fn fetch_with_retry(
        &self,
        range: &YearRange,
        progress: &dyn DownloadProgress,
    ) -> Result<String, FetchError> {
        let url = self.request_url(range);
        let mut state = RetryState::new(&self.policy, range.year);

        loop {
            debug!(
                year = range.year,
                attempt = state.attempt() + 1,
                max_attempts = self.policy.max_attempts,
                %url,
                "requesting"
            );
            let outcome = self.transport.get(&url);

            match state.step(self.policy.classify(outcome)) {
                Step::Done(body) => {
                    debug!(year = range.year, bytes = body.len(), "download complete");
                    return Ok(body);
                }
                Step::WaitAndRetry { delay } => {
                    warn!(
                        year = range.year,
                        wait_secs = delay.as_secs(),
                        "rate limited, waiting before retry"
                    );
                    progress.on_retry(range.year, delay, "rate limited");
                    self.sleeper.sleep(delay);
                }
                Step::BackoffAndRetry { delay, cause } => {
                    warn!(
                        year = range.year,
                        error = %cause,
                        backoff_secs = delay.as_secs(),
                        "attempt failed, backing off"
                    );
                    progress.on_retry(range.year, delay, &cause.to_string());
                    self.sleeper.sleep(delay);
                }
                Step::Aborted(err) => {
                    error!(year = range.year, error = %err, "download aborted");
                    return Err(err);
                }
            }
        }
    }
}

impl<T: Transport, S: Sleeper> PriceProvider for ApgProvider<T, S> {
    fn name(&self) -> &str {
        "apg_exaa_day_ahead"
    }

    fn fetch_year(
        &self,
        range: &YearRange,
        progress: &dyn DownloadProgress,
    ) -> Result<DownloadResult, FetchError> {
        let body = self.fetch_with_retry(range, progress)?;
        Ok(DownloadResult::success(range.year, body))
    }
}

/// Substitute a range into an endpoint template.
pub fn request_url(endpoint: &str, range: &YearRange) -> String {
    endpoint
        .replace("{start}", &range.start_param())
        .replace("{end}", &range.end_param())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::SilentProgress;
    use crate::data::transport::{HttpResponse, TransportError};
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    struct Scripted(RefCell<VecDeque<Result<HttpResponse, TransportError>>>);

    impl Transport for Scripted {
        fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
            self.0
                .borrow_mut()
                .pop_front()
                .expect("transport called more often than scripted")
        }
    }

    #[derive(Default)]
    struct Recorded(RefCell<Vec<Duration>>);

    impl Sleeper for Recorded {
        fn sleep(&self, duration: Duration) {
            self.0.borrow_mut().push(duration);
        }
    }

    fn range(year: i32) -> YearRange {
        YearRange::for_year(year, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()).unwrap()
    }

    #[test]
    fn request_url_substitutes_both_bounds() {
        assert_eq!(
            request_url(DEFAULT_ENDPOINT, &range(2024)),
            "https://transparency.apg.at/api/v1/EXAAD1P/Download/de/PT15M/2024-01-01T000000/2024-12-31T000000"
        );
        assert_eq!(
            request_url(DEFAULT_ENDPOINT, &range(2025)),
            "https://transparency.apg.at/api/v1/EXAAD1P/Download/de/PT15M/2025-01-01T000000/2025-06-15T000000"
        );
    }

    #[test]
    fn backoff_sleeps_then_succeeds() {
        let transport = Scripted(RefCell::new(VecDeque::from(vec![
            Ok(HttpResponse::status(503)),
            Err(TransportError::Timeout("read timed out".into())),
            Ok(HttpResponse::ok("H\nA;B")),
        ])));
        let sleeper = Recorded::default();
        let provider = ApgProvider::new(&transport, DEFAULT_ENDPOINT, RetryPolicy::default())
            .with_sleeper(&sleeper);

        let result = provider.fetch_year(&range(2024), &SilentProgress).unwrap();

        assert_eq!(result.body, "H\nA;B");
        // 503 on attempt 0 backs off 1s, the timeout on attempt 1 backs off 10s.
        assert_eq!(
            *sleeper.0.borrow(),
            vec![Duration::from_secs(1), Duration::from_secs(10)]
        );
    }

    #[test]
    fn no_sleep_after_final_attempt() {
        let transport = Scripted(RefCell::new(VecDeque::from(vec![
            Ok(HttpResponse::status(500)),
            Ok(HttpResponse::status(500)),
            Ok(HttpResponse::status(500)),
        ])));
        let sleeper = Recorded::default();
        let provider = ApgProvider::new(&transport, DEFAULT_ENDPOINT, RetryPolicy::default())
            .with_sleeper(&sleeper);

        let err = provider.fetch_year(&range(2023), &SilentProgress).unwrap_err();

        assert!(matches!(err, FetchError::RetriesExhausted { year: 2023, attempts: 3, .. }));
        assert_eq!(sleeper.0.borrow().len(), 2);
        assert!(transport.0.borrow().is_empty());
    }
}
