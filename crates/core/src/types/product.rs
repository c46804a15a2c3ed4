//! Product records and the payloads that create and update them.
//!
//! Field names follow the storefront's JSON (`originalPrice`, `inStock`),
//! while timestamps keep their `snake_case` names.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::id::ProductId;
use super::section::Section;

/// A product as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
    #[serde(default, serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub original_price: Option<Decimal>,
    /// Image URL or `data:` URI.
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub reviews: u32,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(
        rename = "created_at",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "updated_at",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn default_in_stock() -> bool {
    true
}

/// Payload for creating a product.
///
/// `name` and `price` are required; everything else falls back to the
/// storefront defaults. `filter` selects the target section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub reviews: u32,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, deserialize_with = "deserialize_optional_section")]
    pub filter: Option<Section>,
}

impl NewProduct {
    /// Create a payload with only the required fields set.
    #[must_use]
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            category: String::new(),
            price,
            original_price: None,
            image: String::new(),
            description: String::new(),
            in_stock: true,
            featured: false,
            rating: None,
            reviews: 0,
            tags: BTreeSet::new(),
            filter: None,
        }
    }

    /// Names of fields whose values are present but unusable.
    #[must_use]
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if self.name.trim().is_empty() {
            invalid.push("name");
        }
        if self.price.is_sign_negative() {
            invalid.push("price");
        }
        invalid
    }

    /// Section the product should be placed in.
    #[must_use]
    pub fn section(&self) -> Section {
        self.filter.unwrap_or_default()
    }

    /// Build the stored record with the id and timestamp assigned by the store.
    #[must_use]
    pub fn into_product(self, id: ProductId, now: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name.trim().to_string(),
            category: self.category,
            price: self.price,
            original_price: self.original_price,
            image: self.image,
            description: self.description,
            in_stock: self.in_stock,
            featured: self.featured,
            rating: self.rating,
            reviews: self.reviews,
            tags: clean_tags(self.tags),
            created_at: Some(now),
            updated_at: None,
        }
    }
}

/// Partial update for a product.
///
/// Absent, `null` and empty-string values leave the stored field untouched,
/// so a client cannot clear a text field by sending `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub in_stock: Option<bool>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub reviews: Option<u32>,
    #[serde(default)]
    pub tags: Option<BTreeSet<String>>,
    /// Move the product to another section.
    #[serde(default, deserialize_with = "deserialize_optional_section")]
    pub filter: Option<Section>,
}

impl ProductPatch {
    /// Merge the non-blank fields of this patch into `product`.
    ///
    /// The section move in `filter` is handled by the catalog, not here.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = non_blank(self.name) {
            product.name = name.trim().to_string();
        }
        if let Some(category) = non_blank(self.category) {
            product.category = category;
        }
        if let Some(image) = non_blank(self.image) {
            product.image = image;
        }
        if let Some(description) = non_blank(self.description) {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(original_price) = self.original_price {
            product.original_price = Some(original_price);
        }
        if let Some(in_stock) = self.in_stock {
            product.in_stock = in_stock;
        }
        if let Some(featured) = self.featured {
            product.featured = featured;
        }
        if let Some(rating) = self.rating {
            product.rating = Some(rating);
        }
        if let Some(reviews) = self.reviews {
            product.reviews = reviews;
        }
        if let Some(tags) = self.tags {
            product.tags = clean_tags(tags);
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn clean_tags(tags: BTreeSet<String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Accepts a section name, `null`, or `""` (treated as absent).
fn deserialize_optional_section<'de, D>(deserializer: D) -> Result<Option<Section>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => name.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Patch numbers may arrive as numbers, numeric strings, `null` or `""`;
/// the last two mean "leave unchanged".
fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(Decimal),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(value)) => Ok(Some(value)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid number: {text:?}"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ramo_emma() -> Product {
        NewProduct {
            image: "https://images.example/ramo-emma.jpg".to_string(),
            featured: true,
            ..NewProduct::new("Ramo Emma", Decimal::new(2099, 1))
        }
        .into_product(ProductId::new(1), Utc::now())
    }

    #[test]
    fn test_new_product_defaults() {
        let json = r#"{"name": "Ramo Emma", "price": 209.9}"#;
        let new: NewProduct = serde_json::from_str(json).unwrap();
        assert_eq!(new.price, Decimal::new(2099, 1));
        assert!(new.in_stock);
        assert!(!new.featured);
        assert_eq!(new.section(), Section::Products);
        assert!(new.invalid_fields().is_empty());
    }

    #[test]
    fn test_prices_accept_numeric_strings() {
        let json = r#"{"name": "Rosa", "price": "45.50", "originalPrice": "60"}"#;
        let new: NewProduct = serde_json::from_str(json).unwrap();
        assert_eq!(new.price, Decimal::new(4550, 2));
        assert_eq!(new.original_price, Some(Decimal::new(60, 0)));
    }

    #[test]
    fn test_new_product_requires_name() {
        let json = r#"{"price": 10}"#;
        assert!(serde_json::from_str::<NewProduct>(json).is_err());

        let blank = NewProduct::new("   ", Decimal::ONE);
        assert_eq!(blank.invalid_fields(), vec!["name"]);
    }

    #[test]
    fn test_new_product_blank_filter_means_default_section() {
        let json = r#"{"name": "Rosa", "price": 5, "filter": ""}"#;
        let new: NewProduct = serde_json::from_str(json).unwrap();
        assert_eq!(new.filter, None);

        let json = r#"{"name": "Rosa", "price": 5, "filter": "ofertas"}"#;
        let new: NewProduct = serde_json::from_str(json).unwrap();
        assert_eq!(new.section(), Section::Ofertas);
    }

    #[test]
    fn test_new_product_unknown_filter_is_rejected() {
        let json = r#"{"name": "Rosa", "price": 5, "filter": "novedades"}"#;
        assert!(serde_json::from_str::<NewProduct>(json).is_err());
    }

    #[test]
    fn test_into_product_cleans_tags() {
        let mut new = NewProduct::new("Rosa", Decimal::ONE);
        new.tags = ["  premium ", "", "premium", "fresco"]
            .into_iter()
            .map(String::from)
            .collect();
        let product = new.into_product(ProductId::new(3), Utc::now());
        let tags: Vec<_> = product.tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["fresco", "premium"]);
        assert!(product.created_at.is_some());
        assert!(product.updated_at.is_none());
    }

    #[test]
    fn test_patch_with_only_name_preserves_everything_else() {
        let mut product = ramo_emma();
        let before = product.clone();

        let patch: ProductPatch = serde_json::from_str(r#"{"name": "Ramo Emma Deluxe"}"#).unwrap();
        patch.apply_to(&mut product);

        assert_eq!(product.name, "Ramo Emma Deluxe");
        assert_eq!(product.image, before.image);
        assert_eq!(product.price, before.price);
        assert_eq!(product.featured, before.featured);
        assert_eq!(product.tags, before.tags);
    }

    #[test]
    fn test_patch_blank_and_null_values_do_not_overwrite() {
        let mut product = ramo_emma();
        let before = product.clone();

        let patch: ProductPatch =
            serde_json::from_str(r#"{"name": "", "image": null, "description": "", "price": ""}"#)
                .unwrap();
        patch.apply_to(&mut product);

        assert_eq!(product, before);
    }

    #[test]
    fn test_patch_price_from_string() {
        let patch: ProductPatch = serde_json::from_str(r#"{"price": "99.90"}"#).unwrap();
        assert_eq!(patch.price, Some(Decimal::new(9990, 2)));
        assert!(serde_json::from_str::<ProductPatch>(r#"{"price": "caro"}"#).is_err());
    }

    #[test]
    fn test_patch_false_and_zero_do_overwrite() {
        let mut product = ramo_emma();
        let patch: ProductPatch =
            serde_json::from_str(r#"{"featured": false, "inStock": false, "reviews": 0}"#)
                .unwrap();
        patch.apply_to(&mut product);

        assert!(!product.featured);
        assert!(!product.in_stock);
        assert_eq!(product.reviews, 0);
    }

    #[test]
    fn test_product_wire_format() {
        let product = ramo_emma();
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["price"], 209.9);
        assert_eq!(value["inStock"], true);
        assert!(value["originalPrice"].is_null());
        assert!(value.get("created_at").is_some());
        assert!(value.get("updated_at").is_none());
    }
}
