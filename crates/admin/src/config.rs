//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_TOKEN_SECRET` - Token signing secret (min 32 chars, high entropy)
//! - `ADMIN_PASSWORD_HASH` - Argon2 PHC hash of the admin password, or
//! - `ADMIN_PASSWORD` - Plain admin password, hashed at startup
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3000)
//! - `ADMIN_BASE_URL` - Public URL (default: <http://localhost:3000>); `https`
//!   marks the auth cookie `Secure`
//! - `ADMIN_USERNAME` - Admin login name (default: admin)
//! - `ADMIN_EMAIL` - Admin email shown after login (default: admin@limaroseflores.pe)
//! - `ADMIN_TOKEN_TTL_SECS` - Token lifetime (default: 86400)
//! - `CATALOG_SEED_PATH` - JSON file the product store starts from
//! - `MAX_BODY_BYTES` - Request body limit (default: 10 MiB)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::services::auth::{hash_password, is_password_hash};

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_EMAIL: &str = "admin@limaroseflores.pe";
const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API
    pub base_url: String,
    /// Admin identity and token settings
    pub auth: AuthConfig,
    /// Seed file for the product store
    pub catalog_seed_path: Option<PathBuf>,
    /// Maximum accepted request body size
    pub max_body_bytes: usize,
    /// Text or JSON logs
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// The single admin identity and how its tokens are signed.
///
/// Implements `Debug` manually to redact the password hash and signing secret.
#[derive(Clone)]
pub struct AuthConfig {
    /// Login name
    pub username: String,
    /// Email returned on login
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: SecretString,
    /// HMAC key for tokens
    pub token_secret: SecretString,
    /// Token and cookie lifetime
    pub token_ttl: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("token_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

impl AuthConfig {
    /// Auth settings for the default admin with the given hash and secret.
    #[must_use]
    pub fn new(password_hash: SecretString, token_secret: SecretString) -> Self {
        Self {
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            password_hash,
            token_secret,
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let token_secret = token_secret_from_env()?;

        let password_hash = get_password_hash()?;

        let token_ttl_secs = get_env_or_default(
            "ADMIN_TOKEN_TTL_SECS",
            &DEFAULT_TOKEN_TTL_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_TOKEN_TTL_SECS".to_string(), e.to_string()))?;
        if token_ttl_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_TOKEN_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            username: get_env_or_default("ADMIN_USERNAME", DEFAULT_ADMIN_USERNAME),
            email: get_env_or_default("ADMIN_EMAIL", DEFAULT_ADMIN_EMAIL),
            password_hash,
            token_secret,
            token_ttl: Duration::from_secs(token_ttl_secs),
        })
    }
}

impl AdminConfig {
    /// Configuration with local defaults around the given auth settings.
    ///
    /// Used by tests and embedders that do not read the environment.
    #[must_use]
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            base_url: DEFAULT_BASE_URL.to_string(),
            auth,
            catalog_seed_path: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            log_format: LogFormat::Text,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("ADMIN_BASE_URL", DEFAULT_BASE_URL);
        Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_BASE_URL".to_string(), e.to_string()))?;
        let auth = AuthConfig::from_env()?;
        let catalog_seed_path = get_optional_env("CATALOG_SEED_PATH").map(PathBuf::from);
        let max_body_bytes = get_env_or_default(
            "MAX_BODY_BYTES",
            &DEFAULT_MAX_BODY_BYTES.to_string(),
        )
        .parse::<usize>()
        .map_err(|e| ConfigError::InvalidEnvVar("MAX_BODY_BYTES".to_string(), e.to_string()))?;
        let log_format = LogFormat::from_env_value(get_optional_env("LOG_FORMAT").as_deref());
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            base_url,
            auth,
            catalog_seed_path,
            max_body_bytes,
            log_format,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the auth cookie should carry the `Secure` flag.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Read and validate `ADMIN_TOKEN_SECRET` on its own.
///
/// Lets tooling sign tokens the server will accept without loading the
/// rest of the admin configuration.
///
/// # Errors
///
/// Returns `ConfigError` if the secret is missing or fails validation.
pub fn token_secret_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    let token_secret = get_validated_secret("ADMIN_TOKEN_SECRET")?;
    validate_secret_length(&token_secret, "ADMIN_TOKEN_SECRET")?;
    Ok(token_secret)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read the admin password hash, hashing a plain `ADMIN_PASSWORD` if that is
/// what was provided.
fn get_password_hash() -> Result<SecretString, ConfigError> {
    if let Some(hash) = get_optional_env("ADMIN_PASSWORD_HASH") {
        if !is_password_hash(&hash) {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_PASSWORD_HASH".to_string(),
                "not an Argon2 PHC string".to_string(),
            ));
        }
        return Ok(SecretString::from(hash));
    }

    let password = get_optional_env("ADMIN_PASSWORD")
        .ok_or_else(|| ConfigError::MissingEnvVar("ADMIN_PASSWORD_HASH".to_string()))?;
    if password.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            "ADMIN_PASSWORD".to_string(),
            "must not be empty".to_string(),
        ));
    }
    tracing::warn!("ADMIN_PASSWORD is set in plain text; prefer ADMIN_PASSWORD_HASH");
    hash_password(&password)
        .map(SecretString::from)
        .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PASSWORD".to_string(), e.to_string()))
}

/// Validate that a secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
pub(crate) fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn auth_config() -> AuthConfig {
        AuthConfig::new(
            SecretString::from("$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g"),
            SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6"),
        )
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-token-secret-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "TEST").is_err());
        assert!(validate_secret_length(&SecretString::from("a".repeat(32)), "TEST").is_ok());
    }

    #[test]
    fn test_log_format_from_env_value() {
        assert_eq!(LogFormat::from_env_value(Some("JSON")), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value(Some("pretty")), LogFormat::Text);
        assert_eq!(LogFormat::from_env_value(None), LogFormat::Text);
    }

    #[test]
    fn test_defaults() {
        let config = AdminConfig::new(auth_config());
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert_eq!(config.auth.username, "admin");
        assert_eq!(config.auth.token_ttl, Duration::from_secs(86_400));
        assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
        assert!(!config.secure_cookies());
    }

    #[test]
    fn test_https_base_url_enables_secure_cookies() {
        let mut config = AdminConfig::new(auth_config());
        config.base_url = "https://admin.limaroseflores.pe".to_string();
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_auth_config_debug_redacts_secrets() {
        let debug_output = format!("{:?}", auth_config());

        assert!(debug_output.contains("admin@limaroseflores.pe"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("argon2id"));
        assert!(!debug_output.contains("aB3$xY9"));
    }
}
