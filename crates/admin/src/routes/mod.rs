//! HTTP routes for the catalog API.
//!
//! # Route Structure
//!
//! Every API route is served at the root and again under `/api`.
//!
//! ```text
//! GET    /health               - Liveness check ("ok")
//!
//! # Catalog
//! GET    /products             - All products keyed by section (or one with ?id=)
//! GET    /products/{id}        - One product and its section
//! POST   /products             - Create (catalog manager)
//! PUT    /products?id=<n>      - Update (catalog manager), also /products/<n>
//! DELETE /products?id=<n>      - Delete (catalog manager), also /products/<n>
//! GET    /stats                - Product, section and featured counts
//!
//! # Auth
//! POST   /login                - Issue a token and set the `token` cookie
//! POST   /logout               - Expire the `token` cookie
//! GET    /verify               - Check a bearer or cookie token
//!
//! # Images
//! POST   /upload               - Validate a base64 image, return a data URI
//! ```

pub mod auth;
pub mod extract;
pub mod products;
pub mod stats;
pub mod upload;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, Method, StatusCode, header},
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::{error::AppError, middleware::request_id_middleware, state::AppState};

/// The JSON API routes, without state or layers.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(products::router())
        .merge(stats::router())
        .merge(auth::router())
        .merge(upload::router())
        .method_not_allowed_fallback(unsupported_method)
}

/// The complete application: routes, fallbacks and middleware, with state
/// applied. Error-tracking layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let api = api_routes();
    let max_body_bytes = state.config().max_body_bytes;

    Router::new()
        .route("/health", get(health))
        .merge(api.clone())
        .nest("/api", api)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(cors_layer())
        .with_state(state)
}

/// Permissive CORS: any origin, the API's verbs and the two headers clients
/// send.
fn cors_layer() -> CorsLayer {
    const ALLOWED_HEADERS: [HeaderName; 2] = [header::CONTENT_TYPE, header::AUTHORIZATION];

    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(ALLOWED_HEADERS)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}

/// Bare `OPTIONS` requests get an empty 200; any other verb a route does not
/// serve gets 405.
async fn unsupported_method(method: Method) -> Response {
    if method == Method::OPTIONS {
        return (StatusCode::OK, Json(json!({}))).into_response();
    }
    AppError::MethodNotAllowed.into_response()
}
