//! services/console/src/config.rs
//!
//! Defines the console's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub upstream_api_url: String,
    pub upstream_api_token: Option<String>,
    pub upstream_timeout: Duration,
    pub admin_token: String,
    pub log_level: Level,
    /// Cap on concurrent enrichment lookups; `None` is unbounded.
    pub fanout_limit: Option<NonZeroUsize>,
    pub default_page_size: NonZeroUsize,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Server Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        // --- Upstream REST API ---
        let upstream_api_url = var("UPSTREAM_API_URL")
            .ok_or_else(|| ConfigError::MissingVar("UPSTREAM_API_URL".to_string()))?
            .trim_end_matches('/')
            .to_string();
        let upstream_api_token = var("UPSTREAM_API_TOKEN").filter(|t| !t.is_empty());
        let upstream_timeout = Duration::from_secs(parse_number(&var, "UPSTREAM_TIMEOUT_SECS", 30)?);

        // --- Admin Access ---
        let admin_token = var("ADMIN_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("ADMIN_TOKEN".to_string()))?;

        // --- List Engine Settings ---
        let fanout_limit = match var("FANOUT_LIMIT") {
            None => None,
            Some(raw) => Some(parse_non_zero("FANOUT_LIMIT", &raw)?),
        };
        let default_page_size = match var("DEFAULT_PAGE_SIZE") {
            None => swim_admin_core::query::DEFAULT_PAGE_SIZE,
            Some(raw) => parse_non_zero("DEFAULT_PAGE_SIZE", &raw)?,
        };

        Ok(Self {
            bind_address,
            upstream_api_url,
            upstream_api_token,
            upstream_timeout,
            admin_token,
            log_level,
            fanout_limit,
            default_page_size,
            cors_origin,
        })
    }
}

fn parse_number(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    match var(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
    }
}

fn parse_non_zero(name: &str, raw: &str) -> Result<NonZeroUsize, ConfigError> {
    raw.parse::<NonZeroUsize>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}
