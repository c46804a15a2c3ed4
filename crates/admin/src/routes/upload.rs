//! Image upload.
//!
//! Images are not written anywhere. The handler validates the base64
//! payload and hands back a `data:` URI the client stores as the product
//! `image`.

use axum::{Json, Router, routing::post};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use super::extract::ApiJson;
use crate::{error::AppError, middleware::RequireCatalogManager, state::AppState};

const DEFAULT_EXTENSION: &str = "jpg";

/// Build the upload router.
pub fn router() -> Router<AppState> {
    Router::new().route("/upload", post(upload_image))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[serde(default)]
    pub image_data: String,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: &'static str,
    pub image_path: String,
}

/// `POST /upload`.
///
/// # Errors
///
/// Returns 400 for an empty payload, invalid base64 or a non-image
/// extension.
pub async fn upload_image(
    RequireCatalogManager(claims): RequireCatalogManager,
    ApiJson(body): ApiJson<UploadRequest>,
) -> Result<Json<UploadResponse>, AppError> {
    let image_path = to_data_uri(body.image_data.trim(), body.filename.as_deref())?;
    tracing::info!(
        username = %claims.username,
        bytes = image_path.len(),
        "Image processed"
    );

    Ok(Json(UploadResponse {
        message: "Image processed successfully",
        image_path,
    }))
}

/// Turn an upload payload into a `data:` URI.
///
/// A payload that already is a `data:image/...;base64,` URI is validated and
/// passed through unchanged. A bare base64 string gets its MIME type from the
/// filename's extension, `jpg` when there is none.
fn to_data_uri(image_data: &str, filename: Option<&str>) -> Result<String, AppError> {
    if image_data.is_empty() {
        return Err(AppError::Validation("No image data provided".to_string()));
    }

    if let Some(rest) = image_data.strip_prefix("data:") {
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| AppError::Validation("Malformed data URI".to_string()))?;
        let mime = header.strip_suffix(";base64").ok_or_else(|| {
            AppError::Validation("Data URI must be base64 encoded".to_string())
        })?;
        if !mime.starts_with("image/") {
            return Err(AppError::Validation(format!("Unsupported image type: {mime}")));
        }
        decode(payload)?;
        return Ok(image_data.to_string());
    }

    let mime = mime_for(filename)?;
    decode(image_data)?;
    Ok(format!("data:{mime};base64,{image_data}"))
}

fn decode(payload: &str) -> Result<Vec<u8>, AppError> {
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| AppError::Validation(format!("Invalid base64 image data: {e}")))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("No image data provided".to_string()));
    }
    Ok(bytes)
}

fn mime_for(filename: Option<&str>) -> Result<&'static str, AppError> {
    let extension = filename
        .and_then(|name| name.rsplit_once('.'))
        .map_or(DEFAULT_EXTENSION, |(_, ext)| ext)
        .to_ascii_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "png" => Ok("image/png"),
        "gif" => Ok("image/gif"),
        "webp" => Ok("image/webp"),
        other => Err(AppError::Validation(format!(
            "Unsupported image extension: {other}"
        ))),
    }
}
