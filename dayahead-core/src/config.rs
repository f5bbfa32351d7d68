//! Download configuration, loadable from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! stock 2023-2025 EXAA download.

use crate::data::apg::DEFAULT_ENDPOINT;
use crate::data::merge::{HeaderMode, JoinStyle, CANONICAL_HEADER};
use crate::data::retry::RetryPolicy;
use crate::data::year_range::SUPPORTED_YEARS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_YEARS: [i32; 3] = [2023, 2024, 2025];
pub const DEFAULT_OUTPUT: &str = "dayahead_prices_2023-2025.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Whether the merged file gets the canonical header or the first response's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStyle {
    #[default]
    Canonical,
    KeepFirst,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub years: Vec<i32>,
    /// URL template containing `{start}` and `{end}`.
    pub endpoint: String,
    pub output: PathBuf,
    pub header: String,
    pub header_style: HeaderStyle,
    pub join_style: JoinStyle,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            years: DEFAULT_YEARS.to_vec(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            header: CANONICAL_HEADER.to_owned(),
            header_style: HeaderStyle::Canonical,
            join_style: JoinStyle::Verbatim,
            connect_timeout_secs: 10,
            read_timeout_secs: 120,
            retry: RetryConfig::default(),
        }
    }
}

/// `[retry]` table; durations in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub status_backoff_secs: u64,
    pub network_backoff_secs: u64,
    pub default_retry_after_secs: u64,
    pub max_rate_limit_waits: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            status_backoff_secs: policy.status_backoff_base.as_secs(),
            network_backoff_secs: policy.network_backoff_base.as_secs(),
            default_retry_after_secs: policy.default_retry_after.as_secs(),
            max_rate_limit_waits: policy.max_rate_limit_waits,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            status_backoff_base: Duration::from_secs(self.status_backoff_secs),
            network_backoff_base: Duration::from_secs(self.network_backoff_secs),
            default_retry_after: Duration::from_secs(self.default_retry_after_secs),
            max_rate_limit_waits: self.max_rate_limit_waits,
        }
    }
}

impl FetchConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.years.is_empty() {
            return Err(ConfigError::Invalid("years must not be empty".into()));
        }
        if let Some(year) = self.years.iter().find(|y| !SUPPORTED_YEARS.contains(*y)) {
            return Err(ConfigError::Invalid(format!(
                "year {year} is outside {}..={}",
                SUPPORTED_YEARS.start(),
                SUPPORTED_YEARS.end()
            )));
        }
        if !self.endpoint.contains("{start}") || !self.endpoint.contains("{end}") {
            return Err(ConfigError::Invalid(
                "endpoint must contain {start} and {end} placeholders".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".into()));
        }
        if self.header_style == HeaderStyle::Canonical && self.header.contains('\n') {
            return Err(ConfigError::Invalid("header must be a single line".into()));
        }
        Ok(())
    }

    pub fn header_mode(&self) -> HeaderMode {
        match self.header_style {
            HeaderStyle::Canonical => HeaderMode::Canonical(self.header.clone()),
            HeaderStyle::KeepFirst => HeaderMode::KeepFirst,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.to_policy()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}
