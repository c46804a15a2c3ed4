//! Storefront client errors.

use thiserror::Error;

use lima_rose_core::{CartError, CheckoutError, ProductId};

use crate::storage::StorageError;

/// Errors from the storefront client.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// No product with this id in the catalog.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}
