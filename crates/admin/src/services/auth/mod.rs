//! Admin authentication service.
//!
//! There is exactly one admin identity, configured through the environment.
//! A successful login yields a signed token that clients present as a
//! bearer token or through the `token` cookie.

mod error;
mod token;

pub use error::AuthError;
pub use token::{TokenClaims, TokenSigner};

use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use lima_rose_core::{AdminRole, AdminUserId};

use crate::config::AuthConfig;

/// The configured admin account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminIdentity {
    pub id: AdminUserId,
    pub username: String,
    pub email: String,
    pub role: AdminRole,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub token: String,
    pub claims: TokenClaims,
    pub user: AdminIdentity,
}

/// Admin authentication service.
#[derive(Debug, Clone)]
pub struct AuthService {
    identity: AdminIdentity,
    password_hash: SecretString,
    signer: TokenSigner,
    token_ttl: Duration,
}

impl AuthService {
    /// Build the service from the admin auth settings.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            identity: AdminIdentity {
                id: AdminUserId::new(1),
                username: config.username.clone(),
                email: config.email.clone(),
                role: AdminRole::Admin,
            },
            password_hash: config.password_hash.clone(),
            signer: TokenSigner::new(config.token_secret.clone()),
            token_ttl: config.token_ttl,
        }
    }

    #[must_use]
    pub const fn identity(&self) -> &AdminIdentity {
        &self.identity
    }

    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Check credentials against the admin identity and issue a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown username or a
    /// wrong password; both cases are indistinguishable to the caller.
    /// Returns `AuthError::Blocking` if the hash check task fails.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSession, AuthError> {
        // Always run the hash check so an unknown username costs the same time.
        let password = password.to_owned();
        let hash = self.password_hash.clone();
        let password_ok = tokio::task::spawn_blocking(move || {
            verify_password(&password, hash.expose_secret()).is_ok()
        })
        .await
        .map_err(|e| AuthError::Blocking(e.to_string()))?;
        let username_ok = username.trim() == self.identity.username;
        if !(username_ok && password_ok) {
            tracing::warn!(username = %username, "Admin login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let claims = TokenClaims::new(
            self.identity.id,
            self.identity.username.clone(),
            self.identity.role,
            Utc::now(),
            self.token_ttl,
        );
        let token = self.signer.sign(&claims)?;
        tracing::info!(username = %self.identity.username, "Admin logged in");

        Ok(LoginSession {
            token,
            claims,
            user: self.identity.clone(),
        })
    }

    /// Verify a presented token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` or `AuthError::TokenExpired`.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.signer.verify(token, Utc::now())
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the hash is malformed or the
/// password does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Whether `value` parses as a PHC password hash string.
#[must_use]
pub fn is_password_hash(value: &str) -> bool {
    PasswordHash::new(value).is_ok()
}
