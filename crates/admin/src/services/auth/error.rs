//! Admin authentication error types.

use thiserror::Error;

/// Errors that can occur during admin authentication operations.
///
/// The display strings are what API clients see, so they stay generic.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No bearer token or `token` cookie on the request.
    #[error("No token provided")]
    MissingToken,

    /// Token is malformed or its signature does not match.
    #[error("Invalid token")]
    InvalidToken,

    /// Token signature is valid but it is past its expiry.
    #[error("Invalid token")]
    TokenExpired,

    /// Hashing a password failed.
    #[error("failed to hash password")]
    PasswordHash,

    /// Building a token failed.
    #[error("failed to sign token: {0}")]
    Signing(String),

    /// The password check task panicked or was cancelled.
    #[error("password check failed: {0}")]
    Blocking(String),
}

impl AuthError {
    /// Whether the error is the client's fault rather than the server's.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::MissingToken | Self::InvalidToken | Self::TokenExpired
        )
    }
}
