//! Client configuration.
//!
//! Values come from the environment so the same binary can target a local
//! mock server or a real identity server.

use std::time::Duration;

use crate::error::ConfigError;

pub const BASE_URL_VAR: &str = "CONSOLE_API_BASE_URL";
pub const TIMEOUT_VAR: &str = "CONSOLE_API_TIMEOUT_MS";

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Applied to every request that does not carry its own timeout.
    /// `None` disables the default.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Unset variables keep their
    /// defaults; `0` for the timeout disables it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(BASE_URL_VAR) {
            let parsed = url::Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidBaseUrl {
                var: BASE_URL_VAR,
                reason: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidBaseUrl {
                    var: BASE_URL_VAR,
                    reason: format!("unsupported scheme {}", parsed.scheme()),
                });
            }
            config.base_url = parsed.as_str().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let ms: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidTimeout {
                var: TIMEOUT_VAR,
                value: raw.clone(),
            })?;
            config.request_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }

        Ok(config)
    }
}
