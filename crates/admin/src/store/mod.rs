//! In-memory product store.
//!
//! One [`Catalog`] behind an async `RwLock`, created at startup and shared
//! through `AppState`. Every operation holds the lock for its whole
//! duration, so each one is atomic; nothing spans requests and nothing
//! survives a restart.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;

use lima_rose_core::{
    Catalog, CatalogError, CatalogStats, NewProduct, Product, ProductId, ProductPatch, Section,
    default_catalog,
};

/// Errors from the product store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("failed to read catalog seed {}: {source}", path.display())]
    SeedRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Thread-safe wrapper around the catalog.
#[derive(Debug)]
pub struct ProductStore {
    catalog: RwLock<Catalog>,
}

impl Default for ProductStore {
    fn default() -> Self {
        Self::new(default_catalog())
    }
}

impl ProductStore {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
        }
    }

    /// Load the store from a seed file, or the built-in catalog when no path
    /// is given.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SeedRead` if the file cannot be read and
    /// `StoreError::Catalog` if it is not a valid catalog.
    pub async fn load(seed_path: Option<&Path>) -> Result<Self, StoreError> {
        let Some(path) = seed_path else {
            tracing::info!("Seeding product store with the built-in catalog");
            return Ok(Self::default());
        };

        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StoreError::SeedRead {
                path: path.to_path_buf(),
                source,
            })?;
        let catalog = Catalog::from_json_str(&json)?;
        tracing::info!(
            path = %path.display(),
            products = catalog.len(),
            "Seeded product store from file"
        );
        Ok(Self::new(catalog))
    }

    /// Snapshot of the whole catalog.
    pub async fn list(&self) -> Catalog {
        self.catalog.read().await.clone()
    }

    pub async fn find(&self, id: ProductId) -> Option<(Section, Product)> {
        self.catalog
            .read()
            .await
            .find(id)
            .map(|(section, product)| (section, product.clone()))
    }

    pub async fn stats(&self) -> CatalogStats {
        self.catalog.read().await.stats()
    }

    /// # Errors
    ///
    /// Returns `StoreError::Catalog` if the product data is invalid.
    #[instrument(skip(self, data), fields(name = %data.name))]
    pub async fn add(&self, data: NewProduct) -> Result<Product, StoreError> {
        let section = data.section();
        let product = self.catalog.write().await.add(data)?;
        tracing::info!(product_id = %product.id, %section, "Product created");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `StoreError::Catalog` with `CatalogError::NotFound` for an
    /// unknown id.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, StoreError> {
        let moved_to = patch.filter;
        let product = self.catalog.write().await.update(id, patch)?;
        match moved_to {
            Some(section) => tracing::info!(product_id = %id, %section, "Product updated"),
            None => tracing::info!(product_id = %id, "Product updated"),
        }
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `StoreError::Catalog` with `CatalogError::NotFound` for an
    /// unknown id.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<Product, StoreError> {
        let removed = self.catalog.write().await.delete(id)?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(removed)
    }
}
