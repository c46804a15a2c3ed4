//! Catalog statistics.

use axum::{Json, Router, extract::State, routing::get};

use lima_rose_core::CatalogStats;

use crate::state::AppState;

/// Build the stats router.
pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(catalog_stats))
}

/// `GET /stats`: product, section and featured counts.
pub async fn catalog_stats(State(state): State<AppState>) -> Json<CatalogStats> {
    Json(state.store().stats().await)
}
