//! Admin credential commands.
//!
//! # Usage
//!
//! ```bash
//! # Hash a password for ADMIN_PASSWORD_HASH
//! lr-cli hash-password 'limarose2025'
//!
//! # Mint a read-only token (uses ADMIN_TOKEN_SECRET)
//! lr-cli token issue --username auditor --role viewer --ttl-secs 3600
//! ```

use std::time::Duration;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use lima_rose_admin::config::{ConfigError, token_secret_from_env};
use lima_rose_admin::services::auth::{AuthError, TokenClaims, TokenSigner, hash_password};
use lima_rose_core::{AdminRole, AdminUserId};

/// Errors from credential commands.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Argon2 PHC string for a password.
///
/// # Errors
///
/// Returns an error for an empty password or if hashing fails.
pub fn hash(password: &SecretString) -> Result<String, CredentialError> {
    let password = password.expose_secret();
    if password.is_empty() {
        return Err(CredentialError::InvalidArgument(
            "password must not be empty".to_string(),
        ));
    }
    Ok(hash_password(password)?)
}

/// Sign a token the admin API will accept.
///
/// Tokens minted here carry user id 0 so they can be told apart from the
/// configured admin's logins.
///
/// # Errors
///
/// Returns an error if `ADMIN_TOKEN_SECRET` is missing or weak, the
/// username is blank, or the lifetime is zero.
pub fn issue_token(
    username: &str,
    role: AdminRole,
    ttl_secs: u64,
) -> Result<String, CredentialError> {
    if username.trim().is_empty() {
        return Err(CredentialError::InvalidArgument(
            "username must not be blank".to_string(),
        ));
    }
    if ttl_secs == 0 {
        return Err(CredentialError::InvalidArgument(
            "ttl must be greater than zero".to_string(),
        ));
    }

    let signer = TokenSigner::new(token_secret_from_env()?);
    let claims = TokenClaims::new(
        AdminUserId::new(0),
        username.trim().to_string(),
        role,
        Utc::now(),
        Duration::from_secs(ttl_secs),
    );
    let token = signer.sign(&claims)?;

    tracing::info!(
        username = %claims.username,
        role = %role,
        expires_at = ?claims.expires_at(),
        "Token issued"
    );
    Ok(token)
}
