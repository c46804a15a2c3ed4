//! Lima Rose Core - Shared types library.
//!
//! This crate provides common types used across all Lima Rose components:
//! - `admin` - Catalog JSON API with the admin auth gate
//! - `storefront` - Storefront client (catalog fetch, cart, checkout)
//! - `cli` - Command-line tools for operators
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no locking,
//! no HTTP clients. The admin API wraps [`Catalog`] in its own store and the
//! storefront persists [`Cart`] through its device storage.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices, sections, products, roles, stats
//! - [`catalog`] - The section-keyed product catalog
//! - [`cart`] - Client-side shopping cart
//! - [`checkout`] - Three-step checkout flow and order confirmation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod types;

pub use cart::{Cart, CartError, CartItem, MAX_CART_ITEMS};
pub use catalog::{Catalog, CatalogError, default_catalog};
pub use checkout::{
    CheckoutError, CheckoutFlow, CheckoutStep, ContactInfo, DeliveryDetails, DeliveryZones,
    OrderConfirmation, PaymentMethod, TimeSlot, order_number,
};
pub use types::*;
