//! Day-ahead core: download EXAA day-ahead prices from the APG transparency
//! platform year by year and merge them into one CSV.
//!
//! - Year ranges (current year ends today, others on Dec 31)
//! - Explicit retry policy: exponential backoff, `Retry-After` on 429
//! - Blocking HTTP transport behind a trait, so tests can script responses
//! - Pure header-replacing CSV merge
//! - `pipeline::run`, which writes the output only when every year succeeded

pub mod config;
pub mod data;
pub mod pipeline;

pub use config::{ConfigError, FetchConfig, HeaderStyle, RetryConfig};
pub use pipeline::{run, RunError, RunSummary};
