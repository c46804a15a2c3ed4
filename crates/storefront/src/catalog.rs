//! HTTP client for the catalog API.
//!
//! The full catalog is small, so it is fetched in one request and cached
//! with `moka`. Section, featured, category, text, price, occasion and
//! related-product filters run on the cached copy.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use lima_rose_core::{Catalog, CatalogStats, Product, ProductId, Section};

use crate::config::StorefrontConfig;
use crate::error::StorefrontError;
use crate::filter::{self, Occasion, PriceRange};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    Catalog,
    Stats,
}

#[derive(Debug, Clone)]
enum CacheValue {
    Catalog(Arc<Catalog>),
    Stats(CatalogStats),
}

/// Error bodies from the API carry a `message`.
#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

/// Client for the catalog API.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a client from the storefront configuration.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        Self::with_base_url(config.api_url.clone(), config.cache_ttl)
    }

    /// Create a client for an API root such as `http://localhost:3000/api`.
    #[must_use]
    pub fn with_base_url(mut base_url: Url, cache_ttl: Duration) -> Self {
        // Url::join replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(cache_ttl)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url,
                cache,
            }),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, StorefrontError> {
        let url = self.inner.base_url.join(path)?;
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiMessage>(&body).map_or_else(
                |_| body.chars().take(200).collect(),
                |m| m.message,
            );
            tracing::error!(status = %status, message = %message, "Catalog API returned non-success status");
            return Err(StorefrontError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog API response"
            );
            StorefrontError::Parse(e)
        })
    }

    /// The whole catalog, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not a
    /// catalog.
    #[instrument(skip(self))]
    pub async fn catalog(&self) -> Result<Arc<Catalog>, StorefrontError> {
        if let Some(CacheValue::Catalog(catalog)) = self.inner.cache.get(&CacheKey::Catalog).await {
            debug!("Cache hit for catalog");
            return Ok(catalog);
        }

        let catalog: Arc<Catalog> = Arc::new(self.get_json("products").await?);
        self.inner
            .cache
            .insert(CacheKey::Catalog, CacheValue::Catalog(Arc::clone(&catalog)))
            .await;
        debug!(products = catalog.len(), "Fetched catalog");
        Ok(catalog)
    }

    /// Catalog counts as computed by the API.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<CatalogStats, StorefrontError> {
        if let Some(CacheValue::Stats(stats)) = self.inner.cache.get(&CacheKey::Stats).await {
            debug!("Cache hit for stats");
            return Ok(stats);
        }

        let stats: CatalogStats = self.get_json("stats").await?;
        self.inner
            .cache
            .insert(CacheKey::Stats, CacheValue::Stats(stats))
            .await;
        Ok(stats)
    }

    /// Drop cached responses so the next call refetches.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    /// # Errors
    ///
    /// Returns `StorefrontError::ProductNotFound` if no section holds the id.
    pub async fn product(&self, id: ProductId) -> Result<(Section, Product), StorefrontError> {
        let catalog = self.catalog().await?;
        catalog
            .find(id)
            .map(|(section, product)| (section, product.clone()))
            .ok_or(StorefrontError::ProductNotFound(id))
    }

    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched.
    pub async fn section(&self, section: Section) -> Result<Vec<Product>, StorefrontError> {
        Ok(self.catalog().await?.section(section).to_vec())
    }

    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched.
    pub async fn featured(&self) -> Result<Vec<Product>, StorefrontError> {
        Ok(featured(&*self.catalog().await?))
    }

    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched.
    pub async fn by_category(&self, category: &str) -> Result<Vec<Product>, StorefrontError> {
        Ok(by_category(&*self.catalog().await?, category))
    }

    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched.
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, StorefrontError> {
        Ok(search(&*self.catalog().await?, query))
    }

    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched.
    pub async fn by_price_range(&self, range: PriceRange) -> Result<Vec<Product>, StorefrontError> {
        Ok(filter::by_price_range(&*self.catalog().await?, range))
    }

    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched.
    pub async fn by_occasion(&self, occasion: Occasion) -> Result<Vec<Product>, StorefrontError> {
        Ok(filter::by_occasion(&*self.catalog().await?, occasion))
    }

    /// Products to suggest on the page of product `id`.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::ProductNotFound` if no section holds the id.
    pub async fn related(&self, id: ProductId, limit: usize) -> Result<Vec<Product>, StorefrontError> {
        let catalog = self.catalog().await?;
        let (_, product) = catalog.find(id).ok_or(StorefrontError::ProductNotFound(id))?;
        Ok(filter::related(&catalog, product, limit))
    }
}

/// Featured products across all sections.
#[must_use]
pub fn featured(catalog: &Catalog) -> Vec<Product> {
    catalog
        .iter()
        .filter(|(_, p)| p.featured)
        .map(|(_, p)| p.clone())
        .collect()
}

/// Products whose category matches, ignoring case.
#[must_use]
pub fn by_category(catalog: &Catalog, category: &str) -> Vec<Product> {
    let category = category.trim();
    catalog
        .iter()
        .filter(|(_, p)| p.category.eq_ignore_ascii_case(category))
        .map(|(_, p)| p.clone())
        .collect()
}

/// Products whose name, description, category or tags contain `query`,
/// ignoring case. A blank query matches nothing.
#[must_use]
pub fn search(catalog: &Catalog, query: &str) -> Vec<Product> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    catalog
        .iter()
        .map(|(_, p)| p)
        .filter(|p| {
            p.name.to_lowercase().contains(&query)
                || p.description.to_lowercase().contains(&query)
                || p.category.to_lowercase().contains(&query)
                || p.tags.iter().any(|t| t.to_lowercase().contains(&query))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lima_rose_core::default_catalog;

    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = CatalogClient::with_base_url(
            Url::parse("http://localhost:3000/api").unwrap(),
            Duration::from_secs(1),
        );
        assert_eq!(client.base_url().as_str(), "http://localhost:3000/api/");
        assert_eq!(
            client.base_url().join("products").unwrap().as_str(),
            "http://localhost:3000/api/products"
        );
    }

    #[test]
    fn test_featured() {
        let catalog = default_catalog();
        let names: Vec<_> = featured(&catalog).into_iter().map(|p| p.name).collect();
        assert!(names.contains(&"Ramo Emma".to_string()));
        assert!(names.len() < catalog.len());
    }

    #[test]
    fn test_by_category_ignores_case() {
        let catalog = default_catalog();
        let category = catalog.iter().next().unwrap().1.category.to_uppercase();
        assert!(!by_category(&catalog, &category).is_empty());
        assert!(by_category(&catalog, "no-such-category").is_empty());
    }

    #[test]
    fn test_search() {
        let catalog = default_catalog();
        let hits = search(&catalog, "emma");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.first().unwrap().id, ProductId::new(1));
        assert!(search(&catalog, "   ").is_empty());
    }
}
