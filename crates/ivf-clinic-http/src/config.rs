//! Client configuration, resolved once at startup.

use std::time::Duration;

use ivf_clinic_core::models::DEFAULT_PAGE_SIZE;
use thiserror::Error;

pub const ENV_BASE_URL: &str = "CLINIC_API_BASE_URL";
pub const ENV_TOKEN: &str = "CLINIC_API_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "CLINIC_API_TIMEOUT_SECS";
pub const ENV_CACHE_STALE_SECS: &str = "CLINIC_CACHE_STALE_SECS";
pub const ENV_PAGE_SIZE: &str = "CLINIC_PAGE_SIZE";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_STALE_SECS: u64 = 60;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required variable {0}")]
    Missing(&'static str),

    #[error("Invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// API base, without trailing slash
    pub base_url: String,
    /// Forwarded verbatim as a bearer token
    pub bearer_token: Option<String>,
    pub timeout: Duration,
    pub cache_stale_after: Duration,
    pub page_size: u32,
}

impl ClientConfig {
    /// Read from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let base_url = get(ENV_BASE_URL).ok_or(ConfigError::Missing(ENV_BASE_URL))?;
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: ENV_BASE_URL,
                value: base_url,
                reason: "must start with http:// or https://",
            });
        }

        let timeout = parse_positive(ENV_TIMEOUT_SECS, get(ENV_TIMEOUT_SECS), DEFAULT_TIMEOUT_SECS)?;
        let stale = match get(ENV_CACHE_STALE_SECS) {
            // zero disables caching
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: ENV_CACHE_STALE_SECS,
                value: raw,
                reason: "expected whole seconds",
            })?,
            None => DEFAULT_CACHE_STALE_SECS,
        };
        let page_size = parse_positive(ENV_PAGE_SIZE, get(ENV_PAGE_SIZE), DEFAULT_PAGE_SIZE as u64)?;
        let page_size = u32::try_from(page_size).map_err(|_| ConfigError::Invalid {
            var: ENV_PAGE_SIZE,
            value: page_size.to_string(),
            reason: "too large",
        })?;

        Ok(Self {
            base_url,
            bearer_token: get(ENV_TOKEN),
            timeout: Duration::from_secs(timeout),
            cache_stale_after: Duration::from_secs(stale),
            page_size,
        })
    }
}

fn parse_positive(var: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: "expected a positive integer",
        }),
    }
}
