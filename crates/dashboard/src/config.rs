//! Dashboard configuration, read from `STOCKDASH_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

use stockdash_inventory::GroupDomain;

pub const API_URL_ENV: &str = "STOCKDASH_API_URL";
pub const REQUEST_TIMEOUT_ENV: &str = "STOCKDASH_REQUEST_TIMEOUT_MS";
pub const SEARCH_DEBOUNCE_ENV: &str = "STOCKDASH_SEARCH_DEBOUNCE_MS";
pub const CATEGORIES_ENV: &str = "STOCKDASH_CATEGORIES";
pub const LOCATIONS_ENV: &str = "STOCKDASH_LOCATIONS";
pub const TOP_N_ENV: &str = "STOCKDASH_TOP_N";
pub const EXPORT_DIR_ENV: &str = "STOCKDASH_EXPORT_DIR";

const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/api";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} is not a valid URL ({value}): {reason}")]
    InvalidUrl {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Base URL of the product API; `products` is appended to it.
    pub api_url: Url,
    pub request_timeout: Duration,
    pub search_debounce: Duration,
    pub categories: GroupDomain,
    pub locations: GroupDomain,
    /// Length of the dashboard rankings.
    pub top_n: usize,
    /// Where the binary writes export artifacts; no exports when unset.
    pub export_dir: Option<PathBuf>,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = match get(API_URL_ENV) {
            Some(raw) => parse_url(API_URL_ENV, &raw)?,
            None => {
                tracing::warn!("{API_URL_ENV} not set; using {DEFAULT_API_URL}");
                parse_url(API_URL_ENV, DEFAULT_API_URL)?
            }
        };

        Ok(Self {
            api_url,
            request_timeout: match get(REQUEST_TIMEOUT_ENV) {
                Some(raw) => Duration::from_millis(parse_number(REQUEST_TIMEOUT_ENV, &raw)?),
                None => Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            },
            search_debounce: match get(SEARCH_DEBOUNCE_ENV) {
                Some(raw) => Duration::from_millis(parse_number(SEARCH_DEBOUNCE_ENV, &raw)?),
                None => Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            },
            categories: get(CATEGORIES_ENV).map_or(GroupDomain::Derived, |raw| parse_domain(&raw)),
            locations: get(LOCATIONS_ENV).map_or(GroupDomain::Derived, |raw| parse_domain(&raw)),
            top_n: match get(TOP_N_ENV) {
                Some(raw) => parse_number(TOP_N_ENV, &raw)?,
                None => DEFAULT_TOP_N,
            },
            export_dir: get(EXPORT_DIR_ENV).map(PathBuf::from),
        })
    }
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            key,
            value: raw.to_string(),
            reason: "not a base URL".to_string(),
        });
    }
    Ok(url)
}

fn parse_number<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: raw.to_string(),
    })
}

/// Comma list to a fixed domain; blank entries are skipped.
fn parse_domain(raw: &str) -> GroupDomain {
    GroupDomain::fixed(raw.split(',').map(str::trim).filter(|s| !s.is_empty()))
}
