//! The section-keyed product catalog.
//!
//! A [`Catalog`] maps each [`Section`] to an ordered list of products. Ids
//! are unique across all sections combined and are issued from a high-water
//! mark, so an id is never handed out twice even after the product that
//! held it is deleted.

use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::types::{CatalogStats, NewProduct, Product, ProductId, ProductPatch, Section};

/// Errors from catalog operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("product not found: {0}")]
    NotFound(ProductId),

    #[error("duplicate product id: {0}")]
    DuplicateId(ProductId),

    #[error("product id must be positive, got {0}")]
    InvalidId(ProductId),

    #[error("invalid product: {0}")]
    InvalidProduct(String),

    #[error("invalid catalog: {0}")]
    Parse(String),

    #[error("no product ids left after {0}")]
    IdsExhausted(ProductId),
}

/// Products grouped by section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    sections: BTreeMap<Section, Vec<Product>>,
    high_water: i64,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// An empty catalog holding the canonical sections.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sections: Section::CANONICAL
                .into_iter()
                .map(|s| (s, Vec::new()))
                .collect(),
            high_water: 0,
        }
    }

    /// Parse a catalog from the JSON shape served by `GET /products`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON, unknown section
    /// names, non-positive ids, or ids repeated across sections.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))
    }

    /// The full section mapping.
    #[must_use]
    pub const fn list(&self) -> &BTreeMap<Section, Vec<Product>> {
        &self.sections
    }

    /// Products of one section, in insertion order.
    #[must_use]
    pub fn section(&self, section: Section) -> &[Product] {
        self.sections.get(&section).map_or(&[], Vec::as_slice)
    }

    /// Every product paired with its section.
    pub fn iter(&self) -> impl Iterator<Item = (Section, &Product)> {
        self.sections
            .iter()
            .flat_map(|(section, products)| products.iter().map(move |p| (*section, p)))
    }

    /// Total number of products across all sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The id the next [`Catalog::add`] will assign, or `None` once the
    /// high-water mark has reached `i64::MAX`.
    #[must_use]
    pub const fn next_id(&self) -> Option<ProductId> {
        match self.high_water.checked_add(1) {
            Some(id) => Some(ProductId::new(id)),
            None => None,
        }
    }

    /// Find a product and the section holding it.
    #[must_use]
    pub fn find(&self, id: ProductId) -> Option<(Section, &Product)> {
        self.iter().find(|(_, p)| p.id == id)
    }

    /// Create a product from `data` in the section named by its `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidProduct`] when the name is blank or the
    /// price is negative, and [`CatalogError::IdsExhausted`] when no id is
    /// left to issue.
    pub fn add(&mut self, data: NewProduct) -> Result<Product, CatalogError> {
        let invalid = data.invalid_fields();
        if !invalid.is_empty() {
            return Err(CatalogError::InvalidProduct(format!(
                "invalid fields: {}",
                invalid.join(", ")
            )));
        }

        let id = self
            .next_id()
            .ok_or(CatalogError::IdsExhausted(ProductId::new(self.high_water)))?;
        let section = data.section();
        let product = data.into_product(id, Utc::now());

        self.high_water = id.as_i64();
        self.sections
            .entry(section)
            .or_default()
            .push(product.clone());
        Ok(product)
    }

    /// Merge `patch` into the product with `id`.
    ///
    /// A `filter` in the patch moves the product to the end of that section.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when no section holds `id`.
    pub fn update(&mut self, id: ProductId, patch: ProductPatch) -> Result<Product, CatalogError> {
        let (section, index) = self.locate(id).ok_or(CatalogError::NotFound(id))?;
        let target = patch.filter.unwrap_or(section);

        let products = self
            .sections
            .get_mut(&section)
            .ok_or(CatalogError::NotFound(id))?;

        if target == section {
            let product = products
                .get_mut(index)
                .ok_or(CatalogError::NotFound(id))?;
            patch.apply_to(product);
            product.updated_at = Some(Utc::now());
            return Ok(product.clone());
        }

        let mut product = products.remove(index);
        patch.apply_to(&mut product);
        product.updated_at = Some(Utc::now());
        self.sections
            .entry(target)
            .or_default()
            .push(product.clone());
        Ok(product)
    }

    /// Remove the product with `id`, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when no section holds `id`.
    pub fn delete(&mut self, id: ProductId) -> Result<Product, CatalogError> {
        let (section, index) = self.locate(id).ok_or(CatalogError::NotFound(id))?;
        let products = self
            .sections
            .get_mut(&section)
            .ok_or(CatalogError::NotFound(id))?;
        let removed = products.remove(index);

        if !section.is_canonical() && products.is_empty() {
            self.sections.remove(&section);
        }
        Ok(removed)
    }

    /// Insert a product that already carries an id, as when seeding.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidId`] for a non-positive id and
    /// [`CatalogError::DuplicateId`] when any section already holds it.
    pub fn insert_existing(
        &mut self,
        product: Product,
        section: Section,
    ) -> Result<(), CatalogError> {
        if product.id.as_i64() <= 0 {
            return Err(CatalogError::InvalidId(product.id));
        }
        if self.locate(product.id).is_some() {
            return Err(CatalogError::DuplicateId(product.id));
        }

        self.high_water = self.high_water.max(product.id.as_i64());
        self.sections.entry(section).or_default().push(product);
        Ok(())
    }

    /// Aggregate counts over the catalog.
    #[must_use]
    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            total_products: self.len(),
            total_categories: self.sections.values().filter(|p| !p.is_empty()).count(),
            featured_products: self.iter().filter(|(_, p)| p.featured).count(),
        }
    }

    fn locate(&self, id: ProductId) -> Option<(Section, usize)> {
        self.sections.iter().find_map(|(section, products)| {
            products
                .iter()
                .position(|p| p.id == id)
                .map(|index| (*section, index))
        })
    }
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let visible: Vec<_> = self
            .sections
            .iter()
            .filter(|(section, products)| section.is_canonical() || !products.is_empty())
            .collect();

        let mut map = serializer.serialize_map(Some(visible.len()))?;
        for (section, products) in visible {
            map.serialize_entry(section, products)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<Section, Vec<Product>>::deserialize(deserializer)?;
        let mut catalog = Self::new();
        for (section, products) in raw {
            for product in products {
                catalog
                    .insert_existing(product, section)
                    .map_err(serde::de::Error::custom)?;
            }
        }
        Ok(catalog)
    }
}

/// The catalog a fresh store starts with.
///
/// # Panics
///
/// Never in practice: the built-in seed ids are distinct and positive.
#[must_use]
pub fn default_catalog() -> Catalog {
    let now = Utc::now();
    let seed = [
        Product {
            id: ProductId::new(1),
            name: "Ramo Emma".to_string(),
            category: "ramos".to_string(),
            price: Decimal::new(2099, 1),
            original_price: Some(Decimal::new(2499, 1)),
            image: "https://images.unsplash.com/photo-1563241527-3004b7be0ffd?w=400&h=400&fit=crop"
                .to_string(),
            description: "Elegante ramo de rosas rojas con follaje verde, perfecto para expresar amor y pasión.".to_string(),
            in_stock: true,
            featured: true,
            rating: Some(Decimal::new(48, 1)),
            reviews: 124,
            tags: tags(&["romántico", "elegante", "premium"]),
            created_at: Some(now),
            updated_at: None,
        },
        Product {
            id: ProductId::new(2),
            name: "Arreglo Primaveral".to_string(),
            category: "arreglos".to_string(),
            price: Decimal::new(1599, 1),
            original_price: Some(Decimal::new(1899, 1)),
            image: "https://images.unsplash.com/photo-1490750967868-88aa4486c946?w=400&h=400&fit=crop"
                .to_string(),
            description: "Colorido arreglo floral con flores de temporada en canasta natural.".to_string(),
            in_stock: true,
            featured: false,
            rating: Some(Decimal::new(46, 1)),
            reviews: 89,
            tags: tags(&["colorido", "fresco", "natural"]),
            created_at: Some(now),
            updated_at: None,
        },
        Product {
            id: ProductId::new(3),
            name: "Corona Funeral".to_string(),
            category: "funerarios".to_string(),
            price: Decimal::new(2999, 1),
            original_price: None,
            image: "https://images.unsplash.com/photo-1520763185298-1b434c919102?w=400&h=400&fit=crop"
                .to_string(),
            description: "Corona fúnebre con flores blancas, símbolo de respeto y paz eterna.".to_string(),
            in_stock: true,
            featured: false,
            rating: Some(Decimal::new(49, 1)),
            reviews: 45,
            tags: tags(&["respeto", "elegante", "tradicional"]),
            created_at: Some(now),
            updated_at: None,
        },
    ];

    let mut catalog = Catalog::new();
    for product in seed {
        catalog
            .insert_existing(product, Section::Products)
            .expect("built-in seed ids are distinct and positive");
    }
    catalog
}

fn tags(values: &[&str]) -> std::collections::BTreeSet<String> {
    values.iter().map(|t| (*t).to_string()).collect()
}
