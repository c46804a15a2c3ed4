//! Catalog inspection commands.
//!
//! # Usage
//!
//! ```bash
//! # Validate a seed file before pointing CATALOG_SEED_PATH at it
//! lr-cli catalog check seed.json
//!
//! # Read a running API
//! lr-cli catalog list --api-url http://localhost:3000/api
//! lr-cli catalog stats --api-url http://localhost:3000/api
//! ```

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use lima_rose_core::{Catalog, CatalogError, CatalogStats};
use lima_rose_storefront::{CatalogClient, StorefrontError};

/// Errors from catalog commands.
#[derive(Debug, Error)]
pub enum CatalogCommandError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog: {0}")]
    Invalid(#[from] CatalogError),

    #[error(transparent)]
    Api(#[from] StorefrontError),

    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Parse and validate a seed file; returns the stats it would start with.
///
/// # Errors
///
/// Returns an error if the file cannot be read, names an unknown section,
/// or repeats an id.
pub async fn check(path: &Path) -> Result<CatalogStats, CatalogCommandError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogCommandError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let catalog = Catalog::from_json_str(&json)?;
    let stats = catalog.stats();

    tracing::info!(
        path = %path.display(),
        products = stats.total_products,
        next_id = ?catalog.next_id(),
        "Seed file is valid"
    );
    Ok(stats)
}

fn client(api_url: &str) -> Result<CatalogClient, CatalogCommandError> {
    // One-shot commands never reuse the cache.
    Ok(CatalogClient::with_base_url(
        Url::parse(api_url)?,
        Duration::from_secs(1),
    ))
}

/// One line per product: id, section, name and price.
///
/// # Errors
///
/// Returns an error if the API cannot be reached.
pub async fn list(api_url: &str) -> Result<Vec<String>, CatalogCommandError> {
    let catalog = client(api_url)?.catalog().await?;
    Ok(catalog
        .iter()
        .map(|(section, product)| {
            format!(
                "{:>5}  {:<11} {}  S/ {:.2}",
                product.id.as_i64(),
                section.as_str(),
                product.name,
                product.price
            )
        })
        .collect())
}

/// Stats as reported by the API.
///
/// # Errors
///
/// Returns an error if the API cannot be reached.
pub async fn stats(api_url: &str) -> Result<CatalogStats, CatalogCommandError> {
    Ok(client(api_url)?.stats().await?)
}
