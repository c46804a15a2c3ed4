//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_API_URL` - Base URL of the catalog API (e.g. <https://limaroseflores.pe/api>)
//!
//! ## Optional
//! - `STOREFRONT_STORAGE_DIR` - Directory for device storage (default: .limarose)
//! - `STOREFRONT_STORAGE_PREFIX` - Key prefix for stored values (default: `limarose_`)
//! - `STOREFRONT_WHATSAPP_PHONE` - Shop's WhatsApp number, digits only (default: 51977713388)
//! - `STOREFRONT_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_STORAGE_PREFIX: &str = "limarose_";
pub const DEFAULT_WHATSAPP_PHONE: &str = "51977713388";
const DEFAULT_STORAGE_DIR: &str = ".limarose";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

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
    /// Base URL of the catalog API
    pub api_url: Url,
    /// Where [`FileStorage`](crate::storage::FileStorage) keeps its files
    pub storage_dir: PathBuf,
    /// Namespace for every stored key
    pub storage_prefix: String,
    /// Number orders are sent to on WhatsApp
    pub whatsapp_phone: String,
    /// How long a fetched catalog is reused
    pub cache_ttl: Duration,
}

impl StorefrontConfig {
    /// Configuration with defaults for everything but the API URL.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
            whatsapp_phone: DEFAULT_WHATSAPP_PHONE.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `STOREFRONT_API_URL` is missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = std::env::var("STOREFRONT_API_URL")
            .map_err(|_| ConfigError::MissingEnvVar("STOREFRONT_API_URL".to_string()))?;
        let api_url = Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_API_URL".to_string(), e.to_string())
        })?;

        let mut config = Self::new(api_url);

        if let Ok(dir) = std::env::var("STOREFRONT_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }
        if let Ok(prefix) = std::env::var("STOREFRONT_STORAGE_PREFIX") {
            config.storage_prefix = prefix;
        }
        if let Ok(phone) = std::env::var("STOREFRONT_WHATSAPP_PHONE") {
            config.whatsapp_phone = normalize_phone(&phone).ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "STOREFRONT_WHATSAPP_PHONE".to_string(),
                    "must contain only digits, with an optional leading '+'".to_string(),
                )
            })?;
        }
        if let Ok(ttl) = std::env::var("STOREFRONT_CACHE_TTL_SECS") {
            let secs = ttl.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_CACHE_TTL_SECS".to_string(), e.to_string())
            })?;
            config.cache_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

/// Strip a leading `+` and spaces; `None` unless only digits remain.
fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw
        .trim()
        .trim_start_matches('+')
        .chars()
        .filter(|c| *c != ' ')
        .collect();
    (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())).then_some(digits)
}
