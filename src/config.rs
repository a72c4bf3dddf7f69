//! Runtime settings loaded from the environment.
//!
//! All knobs come from `YTRELAY_*` environment variables (a `.env` file is
//! loaded by the binary before settings are read). The only required value
//! is the API key list; everything else has a sensible default.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Default TTL for cached search responses.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Hard cap on the per-request result count.
pub const DEFAULT_MAX_RESULTS: u32 = 50;

/// Default timeout for a single upstream attempt.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Errors raised while reading configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API keys configured (set YTRELAY_API_KEYS to a comma-separated list)")]
    NoApiKeys,

    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}

/// Runtime settings for the proxy.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Ordered API key rotation list. Never empty.
    pub api_keys: Vec<String>,
    /// How long a cached search response stays servable.
    pub cache_ttl: Duration,
    /// Upper bound on the `maxResults` a caller may request.
    pub max_results: u32,
    /// Timeout applied to each individual upstream attempt.
    pub upstream_timeout: Duration,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_keys = parse_key_list(env::var("YTRELAY_API_KEYS").unwrap_or_default());
        if api_keys.is_empty() {
            return Err(ConfigError::NoApiKeys);
        }

        Ok(Self {
            api_keys,
            cache_ttl: Duration::from_secs(parse_var(
                "YTRELAY_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )?),
            max_results: parse_var("YTRELAY_MAX_RESULTS", DEFAULT_MAX_RESULTS)?,
            upstream_timeout: Duration::from_secs(parse_var(
                "YTRELAY_UPSTREAM_TIMEOUT_SECS",
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )?),
        })
    }
}

/// Split a comma-separated key list, dropping whitespace and empty entries.
fn parse_key_list(raw: String) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}
