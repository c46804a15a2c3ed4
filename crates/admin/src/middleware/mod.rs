//! HTTP middleware and extractors for the admin API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. CORS (permissive, answers preflight)
//! 3. `TraceLayer` (request span with status and latency)
//! 4. Request ID (recorded on the span, echoed in the response)
//! 5. Body limit
//!
//! Authentication is per-handler through the extractors in [`auth`].

pub mod auth;
pub mod request_id;

pub use auth::{
    RequireAdminAuth, RequireCatalogManager, TOKEN_COOKIE, auth_cookie, clear_auth_cookie,
    token_from_headers,
};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
