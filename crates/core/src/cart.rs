//! Client-side shopping cart.
//!
//! The cart never touches the API. The storefront persists it as a JSON
//! array through its device storage.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Product, ProductId};

/// Maximum number of distinct lines a cart may hold.
pub const MAX_CART_ITEMS: usize = 50;

/// Errors from cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    #[error("cart is full ({MAX_CART_ITEMS} items)")]
    Full,

    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Add `quantity` units of `product`, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] for a zero quantity and
    /// [`CartError::Full`] when a new line would exceed [`MAX_CART_ITEMS`].
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<&CartItem, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        if let Some(item) = self.get_mut(product.id) {
            item.quantity = item.quantity.saturating_add(quantity);
        } else {
            if self.items.len() >= MAX_CART_ITEMS {
                return Err(CartError::Full);
            }
            self.items.push(CartItem {
                product_id: product.id,
                name: product.name.clone(),
                price: product.price,
                image: product.image.clone(),
                category: product.category.clone(),
                quantity,
                added_at: Utc::now(),
            });
        }
        self.get(product.id).ok_or(CartError::NotInCart(product.id))
    }

    /// Remove the line for `product_id`.
    pub fn remove(&mut self, product_id: ProductId) -> Option<CartItem> {
        let index = self.items.iter().position(|i| i.product_id == product_id)?;
        Some(self.items.remove(index))
    }

    /// Set the quantity of a line; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] when no line holds `product_id`.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self
                .remove(product_id)
                .map(|_| ())
                .ok_or(CartError::NotInCart(product_id));
        }
        let item = self
            .get_mut(product_id)
            .ok_or(CartError::NotInCart(product_id))?;
        item.quantity = quantity;
        Ok(())
    }

    /// Add one unit to a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] when no line holds `product_id`.
    pub fn increase(&mut self, product_id: ProductId) -> Result<(), CartError> {
        let item = self
            .get_mut(product_id)
            .ok_or(CartError::NotInCart(product_id))?;
        item.quantity = item.quantity.saturating_add(1);
        Ok(())
    }

    /// Take one unit off a line; a line at quantity 1 is removed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] when no line holds `product_id`.
    pub fn decrease(&mut self, product_id: ProductId) -> Result<(), CartError> {
        let quantity = self
            .get(product_id)
            .ok_or(CartError::NotInCart(product_id))?
            .quantity;
        self.update_quantity(product_id, quantity.saturating_sub(1))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn get_mut(&mut self, product_id: ProductId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.product_id == product_id)
    }
}
