//! End-to-end run: ranges → download every year → merge → write.
//!
//! The output file is only touched after every year downloaded; any failure
//! leaves whatever was on disk before untouched.

use crate::config::FetchConfig;
use crate::data::download::download_years;
use crate::data::merge::merge_csv;
use crate::data::provider::{count_data_rows, DownloadProgress, FetchError, PriceProvider};
use crate::data::year_range::{year_ranges, InvalidYear};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    InvalidYear(#[from] InvalidYear),

    #[error("download failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("no years to merge")]
    NothingToMerge,

    #[error("write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub years: Vec<i32>,
    /// Data rows in the written file, header excluded.
    pub data_rows: usize,
    pub bytes_written: usize,
    pub output: PathBuf,
}

/// Download every configured year and write the merged CSV to `config.output`.
pub fn run(
    config: &FetchConfig,
    provider: &dyn PriceProvider,
    today: NaiveDate,
    progress: &dyn DownloadProgress,
) -> Result<RunSummary, RunError> {
    let ranges = year_ranges(&config.years, today)?;

    let results = download_years(provider, &ranges, progress)?;
    let years: Vec<i32> = results.iter().map(|r| r.year).collect();
    let bodies: Vec<&str> = results.iter().map(|r| r.body.as_str()).collect();

    let merged = merge_csv(&bodies, &config.header_mode(), config.join_style)
        .ok_or(RunError::NothingToMerge)?;
    let data_rows = count_data_rows(&merged);

    write_output(&config.output, &merged)?;
    progress.on_saved(&config.output, merged.len());
    info!(
        output = %config.output.display(),
        bytes = merged.len(),
        data_rows,
        "merged CSV written"
    );

    Ok(RunSummary {
        years,
        data_rows,
        bytes_written: merged.len(),
        output: config.output.clone(),
    })
}

/// Create or truncate `path`, creating missing parent directories.
fn write_output(path: &Path, contents: &str) -> Result<(), RunError> {
    let io_err = |source| RunError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, contents).map_err(io_err)
}
