//! Catalog statistics shown on the admin dashboard.

use serde::{Deserialize, Serialize};

/// Aggregate counts over every section of a catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    /// Number of products across all sections.
    pub total_products: usize,
    /// Number of sections holding at least one product.
    pub total_categories: usize,
    /// Number of products flagged as featured.
    pub featured_products: usize,
}
