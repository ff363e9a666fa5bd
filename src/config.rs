//! Application configuration
//!
//! Defaults can be overridden through `TWBT_*` environment variables.

use crate::error::{AppError, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5180;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Initial capital used when a form leaves it empty
pub const DEFAULT_INITIAL_CAPITAL: f64 = 1_000_000.0;

/// State database file name inside the data directory
pub const STATE_DB_FILE: &str = "twbacktest.db";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Analytics backend root (the `/api/...` paths are appended)
    pub api_base_url: Url,
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub http_timeout: Duration,
    pub initial_capital: f64,
}

impl AppConfig {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("TWBT_API_BASE_URL") {
            config = config.with_api_base_url(&raw)?;
        }
        if let Ok(raw) = std::env::var("TWBT_DATA_DIR") {
            config.data_dir = PathBuf::from(raw);
        }
        if let Ok(raw) = std::env::var("TWBT_HOST") {
            config.host = raw;
        }
        if let Ok(raw) = std::env::var("TWBT_PORT") {
            config.port = parse_var("TWBT_PORT", &raw)?;
        }
        if let Ok(raw) = std::env::var("TWBT_HTTP_TIMEOUT_SECS") {
            config.http_timeout = Duration::from_secs(parse_var("TWBT_HTTP_TIMEOUT_SECS", &raw)?);
        }
        if let Ok(raw) = std::env::var("TWBT_INITIAL_CAPITAL") {
            let capital: f64 = parse_var("TWBT_INITIAL_CAPITAL", &raw)?;
            if !(capital > 0.0) {
                return Err(AppError::Config(format!(
                    "TWBT_INITIAL_CAPITAL must be positive, got {}",
                    raw
                )));
            }
            config.initial_capital = capital;
        }

        Ok(config)
    }

    pub fn with_api_base_url(mut self, raw: &str) -> Result<Self> {
        let url = Url::parse(raw)
            .map_err(|e| AppError::Config(format!("Invalid API base URL '{}': {}", raw, e)))?;
        if url.cannot_be_a_base() {
            return Err(AppError::Config(format!("API base URL '{}' cannot be a base", raw)));
        }
        self.api_base_url = url;
        Ok(self)
    }

    /// Path of the persistent state database
    pub fn state_db_path(&self) -> PathBuf {
        self.data_dir.join(STATE_DB_FILE)
    }

    /// `host:port` of the local API server
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default base URL is valid"),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            initial_capital: DEFAULT_INITIAL_CAPITAL,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {} '{}': {}", name, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(config.bind_address(), "127.0.0.1:5180");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.initial_capital, 1_000_000.0);
        assert!(config.state_db_path().ends_with("twbacktest.db"));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = AppConfig::default().with_api_base_url("not a url");
        assert!(matches!(result, Err(AppError::Config(_))));

        let result = AppConfig::default().with_api_base_url("mailto:someone@example.com");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_parse_var() {
        let port: u16 = parse_var("TWBT_PORT", " 8080 ").unwrap();
        assert_eq!(port, 8080);
        assert!(parse_var::<u16>("TWBT_PORT", "eighty").is_err());
    }
}
