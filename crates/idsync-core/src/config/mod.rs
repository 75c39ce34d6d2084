//! Engine configuration loaded from the environment.
//!
//! Both binaries build an [`EngineConfig`] the same way: environment first,
//! with defaults for everything except the upstream endpoint and token.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::sync::DEFAULT_PAGE_SIZE;
use crate::upstream::HttpSourceConfig;
use crate::util::{is_http_url, normalize_text_option};

pub const DATABASE_PATH_VAR: &str = "IDSYNC_DATABASE_PATH";
pub const UPSTREAM_URL_VAR: &str = "IDSYNC_UPSTREAM_URL";
pub const UPSTREAM_TOKEN_VAR: &str = "IDSYNC_UPSTREAM_TOKEN";
pub const POLL_INTERVAL_VAR: &str = "IDSYNC_POLL_INTERVAL_MINUTES";
pub const PAGE_SIZE_VAR: &str = "IDSYNC_PAGE_SIZE";
pub const HTTP_TIMEOUT_VAR: &str = "IDSYNC_HTTP_TIMEOUT_SECS";

const DEFAULT_DATABASE_PATH: &str = "idsync.db";
const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 1;
const MAX_PAGE_SIZE: u32 = 1_000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub database_path: PathBuf,
    pub upstream: HttpSourceConfig,
    pub poll_interval_minutes: u64,
    pub page_size: u32,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_path = PathBuf::from(value_or_default(
            &lookup,
            DATABASE_PATH_VAR,
            DEFAULT_DATABASE_PATH,
        ));

        let base_url = required_trimmed(&lookup, UPSTREAM_URL_VAR)?;
        if !is_http_url(&base_url) {
            return Err(ConfigError::Invalid(format!(
                "{UPSTREAM_URL_VAR} must start with http:// or https://"
            )));
        }
        let access_token = required_trimmed(&lookup, UPSTREAM_TOKEN_VAR)?;

        let poll_interval_minutes = parse_number(
            &lookup,
            POLL_INTERVAL_VAR,
            DEFAULT_POLL_INTERVAL_MINUTES,
            "a positive integer",
        )?;
        if poll_interval_minutes == 0 {
            return Err(ConfigError::Invalid(format!(
                "{POLL_INTERVAL_VAR} must be >= 1"
            )));
        }

        let page_size = parse_number(
            &lookup,
            PAGE_SIZE_VAR,
            DEFAULT_PAGE_SIZE,
            "an integer in [1, 1000]",
        )?;
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ConfigError::Invalid(format!(
                "{PAGE_SIZE_VAR} must be in [1, {MAX_PAGE_SIZE}]"
            )));
        }

        let timeout_secs = parse_number(
            &lookup,
            HTTP_TIMEOUT_VAR,
            DEFAULT_HTTP_TIMEOUT_SECS,
            "an integer in [1, 300]",
        )?;
        if !(1..=300).contains(&timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "{HTTP_TIMEOUT_VAR} must be in [1, 300]"
            )));
        }

        Ok(Self {
            database_path,
            upstream: HttpSourceConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                access_token,
                timeout: Duration::from_secs(timeout_secs),
            },
            poll_interval_minutes,
            page_size,
        })
    }

    /// Delay between reconciliation cycles
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_minutes.saturating_mul(60))
    }
}

pub fn value_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: &str,
) -> String {
    normalize_text_option(lookup(name)).unwrap_or_else(|| default.to_string())
}

fn required_trimmed(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    normalize_text_option(lookup(name)).ok_or(ConfigError::MissingVar(name))
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
    expected: &str,
) -> Result<T, ConfigError> {
    match normalize_text_option(lookup(name)) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid(format!("{name} must be {expected}"))),
    }
}
