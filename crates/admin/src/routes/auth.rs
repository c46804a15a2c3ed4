//! Login, logout and token verification.
//!
//! Login issues a signed token in both the response body and an HTTP-only
//! `token` cookie. Logout expires the cookie; tokens are stateless, so an
//! already issued token stays valid until it expires.

use axum::{
    Json, Router,
    extract::State,
    http::header::SET_COOKIE,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lima_rose_core::{AdminRole, AdminUserId};

use super::extract::ApiJson;
use crate::{
    error::AppError,
    middleware::{RequireAdminAuth, auth_cookie, clear_auth_cookie},
    services::auth::AdminIdentity,
    state::AppState,
};

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/verify", get(verify))
}

/// Login request body. Both fields are required but checked in the handler
/// so a missing field is a 400 with a clear message.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Successful login response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub user: AdminIdentity,
    pub expires_at: Option<DateTime<Utc>>,
}

/// The identity carried by a verified token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUser {
    pub user_id: AdminUserId,
    pub username: String,
    pub role: AdminRole,
}

/// Response for `GET /verify`.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub message: &'static str,
    pub user: TokenUser,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// `POST /login`.
///
/// # Errors
///
/// Returns 400 when a field is missing and 401 for bad credentials.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(username), Some(password)) = (
        body.username.filter(|u| !u.trim().is_empty()),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    };

    let session = state.auth().login(&username, &password).await?;
    let cookie = auth_cookie(
        &session.token,
        state.auth().token_ttl(),
        state.config().secure_cookies(),
    );

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            message: "Login successful",
            expires_at: session.claims.expires_at(),
            token: session.token,
            user: session.user,
        }),
    ))
}

/// `POST /logout`: expire the auth cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(SET_COOKIE, clear_auth_cookie(state.config().secure_cookies()))],
        Json(MessageResponse {
            message: "Logout successful",
        }),
    )
}

/// `GET /verify`: echo the identity of a valid token.
pub async fn verify(RequireAdminAuth(claims): RequireAdminAuth) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        message: "Token valid",
        user: TokenUser {
            user_id: claims.user_id,
            username: claims.username,
            role: claims.role,
        },
    })
}
