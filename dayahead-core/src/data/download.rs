//! Download orchestrator: fetches every year in order, stopping at the first failure.

use super::provider::{DownloadProgress, DownloadResult, FetchError, PriceProvider};
use super::year_range::YearRange;
use tracing::{info, warn};

/// Fetch each range sequentially and return the bodies in year order.
///
/// A year whose retries are exhausted ends the batch: later years are never
/// requested and its error is returned.
pub fn download_years(
    provider: &dyn PriceProvider,
    ranges: &[YearRange],
    progress: &dyn DownloadProgress,
) -> Result<Vec<DownloadResult>, FetchError> {
    let total = ranges.len();
    let mut results = Vec::with_capacity(total);

    info!(provider = provider.name(), years = total, "starting download");

    for (i, range) in ranges.iter().enumerate() {
        progress.on_start(range, i, total);

        match provider.fetch_year(range, progress) {
            Ok(result) => {
                progress.on_complete(range.year, i, total, Ok(result.data_rows()));
                results.push(result);
            }
            Err(e) => {
                progress.on_complete(range.year, i, total, Err(&e));
                warn!(year = range.year, fetched = results.len(), total, "download stopped");
                return Err(e);
            }
        }
    }

    Ok(results)
}
