// Runtime configuration, read from the environment.

use crate::error::ConfigError;
use std::time::Duration;

/// Address the smoke tests of the catalog server listen on.
pub const DEFAULT_API_URL: &str = "http://localhost";

pub const API_URL_VAR: &str = "CATALOG_API_URL";
pub const TIMEOUT_VAR: &str = "CATALOG_API_TIMEOUT_SECS";

/// Where to send requests and how long to wait for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    /// `None` keeps the HTTP client's default.
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn new(api_url: impl Into<String>) -> Self {
        Config {
            api_url: api_url.into(),
            timeout: None,
        }
    }

    /// Build a config from `CATALOG_API_URL` and `CATALOG_API_TIMEOUT_SECS`,
    /// falling back to `http://localhost` and the client default timeout.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, with the variable source injected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(API_URL_VAR)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());

        let timeout = match lookup(TIMEOUT_VAR).map(|s| s.trim().to_string()) {
            None => None,
            Some(s) if s.is_empty() => None,
            Some(s) => {
                let secs: u64 = s.parse().map_err(|_| ConfigError::InvalidTimeout(s.clone()))?;
                Some(Duration::from_secs(secs))
            }
        };

        Ok(Config { api_url, timeout })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_API_URL)
    }
}
