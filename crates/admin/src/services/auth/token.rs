//! Signed, time-limited admin tokens.
//!
//! A token is `base64url(claims JSON) "." base64url(HMAC-SHA256)`, with the
//! MAC computed over the encoded claims. Tokens are stateless: there is no
//! refresh and no revocation list, they simply stop verifying at `exp`.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use lima_rose_core::{AdminRole, AdminUserId};

use super::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Claims carried inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub user_id: AdminUserId,
    pub username: String,
    pub role: AdminRole,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl TokenClaims {
    /// Claims issued at `issued_at` that expire `ttl` later.
    #[must_use]
    pub fn new(
        user_id: AdminUserId,
        username: impl Into<String>,
        role: AdminRole,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let iat = issued_at.timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            user_id,
            username: username.into(),
            role,
            iat,
            exp: iat.saturating_add(ttl_secs),
        }
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Signs and verifies tokens with a shared HMAC key.
///
/// Implements `Debug` manually to redact the key.
#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl TokenSigner {
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Encode and sign `claims`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the claims cannot be serialized.
    pub fn sign(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        let json = serde_json::to_vec(claims).map_err(|e| AuthError::Signing(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Check the signature and expiry of `token` and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for anything malformed or wrongly
    /// signed, and `AuthError::TokenExpired` once `now` reaches `exp`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        let (payload, signature) = token
            .trim()
            .split_once('.')
            .ok_or(AuthError::InvalidToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let mut mac = self.mac().map_err(|_| AuthError::InvalidToken)?;
        mac.update(payload.as_bytes());
        // Constant-time comparison
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims: TokenClaims =
            serde_json::from_slice(&json).map_err(|_| AuthError::InvalidToken)?;

        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    const SECRET: &str = "k7Qz!pW2#vN9$rT4&xL6*mB8^cF3@hJ5";

    fn signer() -> TokenSigner {
        TokenSigner::new(SecretString::from(SECRET))
    }

    fn claims(now: DateTime<Utc>) -> TokenClaims {
        TokenClaims::new(
            AdminUserId::new(1),
            "admin",
            AdminRole::Admin,
            now,
            Duration::from_secs(86_400),
        )
    }

    #[test]
    fn test_sign_then_verify() {
        let now = Utc::now();
        let token = signer().sign(&claims(now)).unwrap();
        let verified = signer().verify(&token, now).unwrap();
        assert_eq!(verified, claims(now));
        assert_eq!(verified.exp - verified.iat, 86_400);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let now = Utc::now();
        let token = signer().sign(&claims(now)).unwrap();
        let later = now + TimeDelta::seconds(86_400);
        assert!(matches!(
            signer().verify(&token, later),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let now = Utc::now();
        let token = signer().sign(&claims(now)).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let mut forged = claims(now);
        forged.username = "intruder".to_string();
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());

        let result = signer().verify(&format!("{forged_payload}.{signature}"), now);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let now = Utc::now();
        let token = signer().sign(&claims(now)).unwrap();
        let other = TokenSigner::new(SecretString::from("a-completely-different-signing-key"));
        assert!(matches!(
            other.verify(&token, now),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let now = Utc::now();
        for token in ["", "abc", "abc.def", "..", "eyJ9.!!!"] {
            assert!(signer().verify(token, now).is_err(), "accepted {token:?}");
        }
    }

    #[test]
    fn test_claims_use_camel_case() {
        let value = serde_json::to_value(claims(Utc::now())).unwrap();
        assert_eq!(value["userId"], 1);
        assert_eq!(value["role"], "admin");
    }

    #[test]
    fn test_debug_redacts_secret() {
        assert!(!format!("{:?}", signer()).contains(SECRET));
    }
}
