//! Calendar-year request windows.
//!
//! Every configured year maps to one request. Past (and future) years cover
//! Jan 1 through Dec 31; the current year stops at today.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use thiserror::Error;

/// Timestamp format expected in the endpoint path (`2024-01-01T000000`).
pub const PARAM_FORMAT: &str = "%Y-%m-%dT000000";

/// Years outside this range cannot be rendered as four-digit path segments.
pub const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1000..=9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("year {0} is outside the supported range 1000..=9999")]
pub struct InvalidYear(pub i32);

/// Start/end window for one year's download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct YearRange {
    pub year: i32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl YearRange {
    pub fn for_year(year: i32, today: NaiveDate) -> Result<Self, InvalidYear> {
        if !SUPPORTED_YEARS.contains(&year) {
            return Err(InvalidYear(year));
        }
        let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(InvalidYear(year))?;
        let end = if year == today.year() {
            today
        } else {
            NaiveDate::from_ymd_opt(year, 12, 31).ok_or(InvalidYear(year))?
        };
        Ok(Self { year, start, end })
    }

    pub fn start_param(&self) -> String {
        self.start.format(PARAM_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(PARAM_FORMAT).to_string()
    }
}

/// Build the ranges for the configured years, ascending and without duplicates.
pub fn year_ranges(years: &[i32], today: NaiveDate) -> Result<Vec<YearRange>, InvalidYear> {
    let mut years = years.to_vec();
    years.sort_unstable();
    years.dedup();
    years
        .into_iter()
        .map(|year| YearRange::for_year(year, today))
        .collect()
}
