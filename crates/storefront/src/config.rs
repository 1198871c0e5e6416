//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STONEART_API_URL` - Base URL of the REST backend
//!
//! ## Optional
//! - `STONEART_STATE_DIR` - Directory for durable client storage
//!   (default: `<platform data dir>/stoneart`)
//! - `STONEART_PAGE_SIZE` - Catalog page size (default: 10)
//! - `STONEART_CURRENCY` - Display currency (default: INR)

use std::path::PathBuf;

use stoneart_core::CurrencyCode;
use thiserror::Error;
use url::Url;

/// Default number of products requested per catalog page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the REST backend
    pub api_url: Url,
    /// Directory holding the durable client storage file
    pub state_dir: PathBuf,
    /// Catalog page size
    pub page_size: u32,
    /// Currency used when formatting prices
    pub currency: CurrencyCode,
}

impl StorefrontConfig {
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

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required keys are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("STONEART_API_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("STONEART_API_URL".to_string()))?;
        let api_url = parse_api_url(&api_url)?;

        let state_dir = match lookup("STONEART_STATE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .map(|dir| dir.join("stoneart"))
                .ok_or_else(|| ConfigError::MissingEnvVar("STONEART_STATE_DIR".to_string()))?,
        };

        let page_size = lookup("STONEART_PAGE_SIZE")
            .map_or(Ok(DEFAULT_PAGE_SIZE), |raw| {
                raw.parse::<u32>()
                    .ok()
                    .filter(|size| *size > 0)
                    .ok_or_else(|| {
                        ConfigError::InvalidEnvVar(
                            "STONEART_PAGE_SIZE".to_string(),
                            format!("expected a positive integer, got {raw:?}"),
                        )
                    })
            })?;

        let currency = lookup("STONEART_CURRENCY")
            .map_or(Ok(CurrencyCode::default()), |raw| raw.parse::<CurrencyCode>())
            .map_err(|e| ConfigError::InvalidEnvVar("STONEART_CURRENCY".to_string(), e))?;

        Ok(Self {
            api_url,
            state_dir,
            page_size,
            currency,
        })
    }

    /// Path of the durable storage document inside `state_dir`.
    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        self.state_dir.join("storage.json")
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| {
        ConfigError::InvalidEnvVar("STONEART_API_URL".to_string(), e.to_string())
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "STONEART_API_URL".to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    Ok(url)
}
