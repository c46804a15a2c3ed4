//! Product catalog handlers.
//!
//! Reads are public. Mutations need a token whose role may manage the
//! catalog. Ids come from `?id=` or the last path segment.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;

use lima_rose_core::{CatalogError, NewProduct, Product, ProductId, ProductPatch, Section};

use super::extract::{ApiJson, has_product_id, product_id};
use crate::{
    error::AppError, middleware::RequireCatalogManager, state::AppState, store::StoreError,
};

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(list_products)
                .post(create_product)
                .put(update_product)
                .delete(delete_product),
        )
        .route(
            "/products/{id}",
            get(show_product).put(update_product).delete(delete_product),
        )
}

/// A single product with the section it lives in.
#[derive(Debug, Serialize)]
pub struct ProductWithSection {
    pub product: Product,
    pub section: Section,
}

/// Response for create and update.
#[derive(Debug, Serialize)]
pub struct ProductMessage {
    pub message: &'static str,
    pub product: Product,
}

/// Response for delete.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedMessage {
    pub message: &'static str,
    pub deleted_id: ProductId,
}

/// `GET /products`: the whole catalog keyed by section, or one product when
/// an id is given.
///
/// # Errors
///
/// Returns the same errors as [`show_product`] when an id is given.
pub async fn list_products(State(state): State<AppState>, uri: Uri) -> Result<Response, AppError> {
    if has_product_id(&uri) {
        return show_product(State(state), uri)
            .await
            .map(IntoResponse::into_response);
    }

    let catalog = state.store().list().await;
    Ok(Json(catalog).into_response())
}

/// `GET /products/{id}`.
///
/// # Errors
///
/// Returns 400 for a bad id and 404 when no product has it.
pub async fn show_product(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Json<ProductWithSection>, AppError> {
    let id = product_id(&uri)?;
    let (section, product) = state
        .store()
        .find(id)
        .await
        .ok_or(StoreError::Catalog(CatalogError::NotFound(id)))?;

    Ok(Json(ProductWithSection { product, section }))
}

/// `POST /products`.
///
/// # Errors
///
/// Returns 400 when required fields are missing or invalid.
pub async fn create_product(
    RequireCatalogManager(_claims): RequireCatalogManager,
    State(state): State<AppState>,
    ApiJson(data): ApiJson<NewProduct>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.store().add(data).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductMessage {
            message: "Product created successfully",
            product,
        }),
    ))
}

/// `PUT /products?id=<n>` or `PUT /products/<n>`.
///
/// # Errors
///
/// Returns 400 for a bad id or body and 404 for an unknown id.
pub async fn update_product(
    RequireCatalogManager(_claims): RequireCatalogManager,
    State(state): State<AppState>,
    uri: Uri,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Json<ProductMessage>, AppError> {
    let id = product_id(&uri)?;
    let product = state.store().update(id, patch).await?;

    Ok(Json(ProductMessage {
        message: "Product updated successfully",
        product,
    }))
}

/// `DELETE /products?id=<n>` or `DELETE /products/<n>`.
///
/// # Errors
///
/// Returns 400 for a bad id and 404 for an unknown id.
pub async fn delete_product(
    RequireCatalogManager(_claims): RequireCatalogManager,
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Json<DeletedMessage>, AppError> {
    let id = product_id(&uri)?;
    let removed = state.store().delete(id).await?;

    Ok(Json(DeletedMessage {
        message: "Product deleted successfully",
        deleted_id: removed.id,
    }))
}
