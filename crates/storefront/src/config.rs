//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FOURFUN_API_BASE_URL` - Base URL of the 4Fun backend API
//!   (e.g., `https://api.4fun.games`)
//!
//! ## Optional
//! - `FOURFUN_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 10)
//! - `FOURFUN_CATALOG_CACHE_CAPACITY` - Max cached catalog entries
//!   (default: 1000)
//! - `FOURFUN_CATALOG_CACHE_TTL_SECS` - Catalog cache time-to-live
//!   (default: 300)

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CATALOG_CACHE_CAPACITY: u64 = 1000;
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the 4Fun backend API.
    pub api_base_url: Url,
    /// Timeout applied to every backend request.
    pub request_timeout: Duration,
    /// Maximum number of cached catalog entries.
    pub catalog_cache_capacity: u64,
    /// Time-to-live for cached catalog entries.
    pub catalog_cache_ttl: Duration,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = required_url("FOURFUN_API_BASE_URL")?;
        let request_timeout = Duration::from_secs(optional_u64(
            "FOURFUN_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        let catalog_cache_capacity = optional_u64(
            "FOURFUN_CATALOG_CACHE_CAPACITY",
            DEFAULT_CATALOG_CACHE_CAPACITY,
        )?;
        let catalog_cache_ttl = Duration::from_secs(optional_u64(
            "FOURFUN_CATALOG_CACHE_TTL_SECS",
            DEFAULT_CATALOG_CACHE_TTL_SECS,
        )?);

        Ok(Self {
            api_base_url,
            request_timeout,
            catalog_cache_capacity,
            catalog_cache_ttl,
        })
    }

    /// Build a configuration for a given base URL with default tuning.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is not absolute.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let api_base_url = Url::parse(base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("FOURFUN_API_BASE_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            catalog_cache_capacity: DEFAULT_CATALOG_CACHE_CAPACITY,
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS),
        })
    }
}

/// Read a required environment variable as an absolute URL.
fn required_url(name: &str) -> Result<Url, ConfigError> {
    let raw =
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
    Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))
}

/// Read an optional environment variable as a `u64`, with a default.
fn optional_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar(name.to_string(), raw)),
        Err(_) => Ok(default),
    }
}
