//! Fetching and merging day-ahead price CSVs.

pub mod apg;
pub mod download;
pub mod merge;
pub mod provider;
pub mod retry;
pub mod transport;
pub mod year_range;

pub use apg::{request_url, ApgProvider, DEFAULT_ENDPOINT};
pub use download::download_years;
pub use merge::{merge_csv, HeaderMode, JoinStyle, CANONICAL_HEADER};
pub use provider::{
    DownloadProgress, DownloadResult, DownloadStatus, FetchError, PriceProvider, SilentProgress,
    StdoutProgress,
};
pub use retry::{RetryPolicy, RetryState, Sleeper, Step, ThreadSleeper};
pub use transport::{HttpResponse, HttpTransport, Transport, TransportError};
pub use year_range::{year_ranges, InvalidYear, YearRange};
