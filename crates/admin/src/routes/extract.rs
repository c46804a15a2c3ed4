//! Request extractors shared by the JSON handlers.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{StatusCode, Uri},
};
use serde::de::DeserializeOwned;

use lima_rose_core::ProductId;

use crate::error::AppError;

/// JSON body extractor whose rejections are `AppError`s.
///
/// An empty body or malformed JSON is a 400 with a JSON message, never
/// axum's plain-text rejection.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge
            } else {
                AppError::Validation(format!("Failed to read request body: {rejection}"))
            }
        })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::Validation("Request body is required".to_string()));
        }

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| AppError::Validation(format!("Invalid request body format: {e}")))
    }
}

/// Read the product id from `?id=`, falling back to the last path segment.
///
/// # Errors
///
/// Returns `AppError::Validation` when no id is present or it is not a
/// positive integer.
pub fn product_id(uri: &Uri) -> Result<ProductId, AppError> {
    let raw = query_id(uri)
        .or_else(|| path_id(uri))
        .ok_or_else(|| {
            AppError::Validation(
                "Product ID is required (use ?id=123 or /products/123)".to_string(),
            )
        })?;

    match raw.parse::<ProductId>() {
        Ok(id) if id.as_i64() > 0 => Ok(id),
        _ => Err(AppError::Validation(format!("Invalid product ID: {raw}"))),
    }
}

/// Whether the request names a product, either way.
pub fn has_product_id(uri: &Uri) -> bool {
    query_id(uri).is_some() || path_id(uri).is_some()
}

fn query_id(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.trim().is_empty())
}

fn path_id(uri: &Uri) -> Option<String> {
    uri.path()
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .filter(|segment| *segment != "products")
        .map(String::from)
}
