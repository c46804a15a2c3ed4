//! Authentication extractors and the auth cookie.
//!
//! A token is accepted from `Authorization: Bearer <token>` first, then from
//! the `token` cookie.

use std::time::Duration;

use axum::{
    extract::FromRequestParts,
    http::{
        HeaderMap,
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
    },
};
use cookie::{Cookie, SameSite};

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{AuthError, TokenClaims};
use crate::state::AppState;

/// Name of the cookie holding the auth token.
pub const TOKEN_COOKIE: &str = "token";

/// Extractor that requires a valid token of any role.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(claims): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", claims.username)
/// }
/// ```
pub struct RequireAdminAuth(pub TokenClaims);

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or(AuthError::MissingToken)?;
        let claims = state.auth().verify(&token)?;

        set_sentry_user(claims.user_id.as_i64(), &claims.username);
        Ok(Self(claims))
    }
}

/// Extractor that requires a token whose role may change the catalog.
///
/// Returns 401 without a valid token and 403 for read-only roles.
pub struct RequireCatalogManager(pub TokenClaims);

impl FromRequestParts<AppState> for RequireCatalogManager {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAdminAuth(claims) = RequireAdminAuth::from_request_parts(parts, state).await?;

        if !claims.role.can_manage_catalog() {
            tracing::warn!(
                username = %claims.username,
                role = %claims.role,
                "Catalog mutation denied"
            );
            return Err(AppError::Forbidden("Insufficient permissions".to_string()));
        }

        Ok(Self(claims))
    }
}

/// Find the token in the `Authorization` header or the `token` cookie.
#[must_use]
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| {
            let (scheme, token) = value.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        })
        .filter(|token| !token.is_empty())
        .map(String::from);
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == TOKEN_COOKIE && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

/// `Set-Cookie` value carrying a freshly issued token.
#[must_use]
pub fn auth_cookie(token: &str, ttl: Duration, secure: bool) -> String {
    let max_age = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    Cookie::build((TOKEN_COOKIE, token.to_string()))
        .http_only(true)
        .path("/")
        .max_age(cookie::time::Duration::seconds(max_age))
        .same_site(SameSite::Strict)
        .secure(secure)
        .build()
        .to_string()
}

/// `Set-Cookie` value that expires the auth cookie.
#[must_use]
pub fn clear_auth_cookie(secure: bool) -> String {
    Cookie::build((TOKEN_COOKIE, String::new()))
        .http_only(true)
        .path("/")
        .max_age(cookie::time::Duration::ZERO)
        .same_site(SameSite::Strict)
        .secure(secure)
        .build()
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_bearer_token_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        headers.insert(COOKIE, HeaderValue::from_static("token=zzz.yyy"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; token=abc.def; lang=es"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_no_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(token_from_headers(&headers).is_none());
        assert!(token_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let cookie = auth_cookie("abc.def", Duration::from_secs(86_400), false);
        assert!(cookie.starts_with("token=abc.def"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(!cookie.contains("Secure"));

        assert!(auth_cookie("abc.def", Duration::from_secs(60), true).contains("Secure"));
    }

    #[test]
    fn test_clear_auth_cookie_expires_immediately() {
        let cookie = clear_auth_cookie(false);
        assert!(cookie.starts_with("token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
