//! Unified error handling for the admin API.
//!
//! Every error renders as JSON with a `message` field. Server errors also
//! carry an `error` field with the detail, and are reported to Sentry.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use lima_rose_core::{CatalogError, ProductId};

use crate::services::auth::AuthError;
use crate::store::StoreError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Product store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Authentication failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Malformed or incomplete request.
    #[error("Bad request: {0}")]
    Validation(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The path exists but not for this HTTP method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Request body exceeds the configured limit.
    #[error("Request body too large")]
    PayloadTooLarge,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::Catalog(err)) => catalog_status(err),
            Self::Store(StoreError::SeedRead { .. }) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) if err.is_client_error() => StatusCode::UNAUTHORIZED,
            Self::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            Self::Store(StoreError::Catalog(CatalogError::NotFound(id))) => {
                product_not_found(*id)
            }
            Self::Store(StoreError::Catalog(err)) if catalog_status(err).is_client_error() => {
                json!({ "message": err.to_string() })
            }
            Self::Auth(err) if err.is_client_error() => json!({ "message": err.to_string() }),
            Self::Store(_) | Self::Auth(_) | Self::Internal(_) => json!({
                "message": "Internal server error",
                "error": self.detail(),
            }),
            Self::Validation(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg) => json!({ "message": msg }),
            Self::MethodNotAllowed | Self::PayloadTooLarge => {
                json!({ "message": self.to_string() })
            }
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::Store(err) => err.to_string(),
            Self::Auth(err) => err.to_string(),
            Self::Internal(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

const fn catalog_status(err: &CatalogError) -> StatusCode {
    match err {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::DuplicateId(_)
        | CatalogError::InvalidId(_)
        | CatalogError::InvalidProduct(_)
        | CatalogError::Parse(_) => StatusCode::BAD_REQUEST,
        CatalogError::IdsExhausted(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn product_not_found(id: ProductId) -> serde_json::Value {
    json!({ "message": "Product not found", "searchedId": id })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        (status, Json(self.body())).into_response()
    }
}

/// Set the Sentry user context from a verified token.
pub fn set_sentry_user(admin_user_id: i64, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_user_id.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("route".to_string());
        assert_eq!(err.to_string(), "Not found: route");

        let err = AppError::Validation("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Validation("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidToken)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::MethodNotAllowed),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Store(StoreError::Catalog(
                CatalogError::InvalidProduct("name".to_string())
            ))),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_product_not_found_body() {
        let err = AppError::Store(StoreError::Catalog(CatalogError::NotFound(
            ProductId::new(999),
        )));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Product not found");
        assert_eq!(body["searchedId"], 999);
    }

    #[tokio::test]
    async fn test_internal_error_echoes_detail() {
        let (status, body) = body_json(AppError::Internal("disk on fire".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["error"], "disk on fire");
    }

    #[tokio::test]
    async fn test_exhausted_ids_are_a_server_error() {
        let err = AppError::Store(StoreError::Catalog(CatalogError::IdsExhausted(
            ProductId::new(i64::MAX),
        )));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_auth_errors_use_client_messages() {
        let (_, body) = body_json(AppError::Auth(AuthError::MissingToken)).await;
        assert_eq!(body["message"], "No token provided");

        let (_, body) = body_json(AppError::Auth(AuthError::TokenExpired)).await;
        assert_eq!(body["message"], "Invalid token");
    }
}
