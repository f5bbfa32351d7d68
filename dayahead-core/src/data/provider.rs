//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over where a year's CSV comes from so the
//! download orchestrator can be driven by a mock in tests.

use super::year_range::YearRange;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Structured error types for download operations.
///
/// These are designed to be displayable in CLI output as-is.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limited by provider for {year} (retry after {retry_after_secs}s, gave up after {waits} waits)")]
    RateLimited {
        year: i32,
        retry_after_secs: u64,
        waits: u32,
    },

    #[error("server responded with HTTP {status}")]
    TransientServerError { status: u16 },

    #[error("network timeout: {0}")]
    NetworkTimeout(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("giving up on {year} after {attempts} attempts: {last}")]
    RetriesExhausted {
        year: i32,
        attempts: u32,
        last: Box<FetchError>,
    },
}

/// Whether a year's download produced a usable body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Success,
    Failed,
}

/// One year's response, held in memory until the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub year: i32,
    pub body: String,
    pub status: DownloadStatus,
}

impl DownloadResult {
    pub fn success(year: i32, body: String) -> Self {
        Self {
            year,
            body,
            status: DownloadStatus::Success,
        }
    }

    /// Number of data rows in the body.
    pub fn data_rows(&self) -> usize {
        count_data_rows(&self.body)
    }
}

/// Number of semicolon-delimited records after the header row of `csv_text`.
///
/// Informational only: malformed records are skipped, not reported.
pub fn count_data_rows(csv_text: &str) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes())
        .records()
        .filter_map(Result::ok)
        .count()
}

/// Trait for day-ahead price sources.
pub trait PriceProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch one year's CSV body, retrying as the provider sees fit.
    fn fetch_year(
        &self,
        range: &YearRange,
        progress: &dyn DownloadProgress,
    ) -> Result<DownloadResult, FetchError>;
}

/// Progress callback for the year-by-year download.
pub trait DownloadProgress {
    /// Called when starting to fetch a year.
    fn on_start(&self, range: &YearRange, index: usize, total: usize);

    /// Called before the provider sleeps ahead of another attempt.
    fn on_retry(&self, year: i32, delay: Duration, reason: &str);

    /// Called when a year's fetch completes; `Ok` carries the data row count.
    fn on_complete(&self, year: i32, index: usize, total: usize, result: Result<usize, &FetchError>);

    /// Called once the merged file has been written.
    fn on_saved(&self, path: &Path, bytes: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, range: &YearRange, index: usize, total: usize) {
        println!(
            "[{}/{}] Downloading data for {} ({} to {})...",
            index + 1,
            total,
            range.year,
            range.start,
            range.end
        );
    }

    fn on_retry(&self, year: i32, delay: Duration, reason: &str) {
        println!("  {year}: {reason}, retrying in {}s", delay.as_secs());
    }

    fn on_complete(&self, year: i32, _index: usize, _total: usize, result: Result<usize, &FetchError>) {
        match result {
            Ok(rows) => println!("  OK: {year} ({rows} rows)"),
            Err(e) => println!("  FAIL: {year}: {e}"),
        }
    }

    fn on_saved(&self, path: &Path, bytes: usize) {
        println!("\nData saved to {} ({bytes} bytes)", path.display());
    }
}

/// Progress reporter that discards every event.
pub struct SilentProgress;

impl DownloadProgress for SilentProgress {
    fn on_start(&self, _range: &YearRange, _index: usize, _total: usize) {}
    fn on_retry(&self, _year: i32, _delay: Duration, _reason: &str) {}
    fn on_complete(&self, _year: i32, _index: usize, _total: usize, _result: Result<usize, &FetchError>) {}
    fn on_saved(&self, _path: &Path, _bytes: usize) {}
}
