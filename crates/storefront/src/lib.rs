//! Lima Rose storefront client.
//!
//! Everything a shopping front end needs besides rendering:
//!
//! - [`catalog`] - Fetch and filter the product catalog, cached with `moka`
//! - [`filter`] - Price buckets, occasions and related products
//! - [`storage`] - Namespaced key-value storage on the device
//! - [`cart`] - Cart that persists itself after every change
//! - [`checkout`] - Three-step checkout ending in a WhatsApp order link
//!
//! # Example
//!
//! ```rust,ignore
//! use lima_rose_storefront::{CartManager, CatalogClient, FileStorage, Namespaced};
//!
//! let client = CatalogClient::new(&config);
//! let emma = client.search("emma").await?;
//!
//! let storage = Namespaced::new(FileStorage::new(&config.storage_dir), &config.storage_prefix);
//! let mut cart = CartManager::open(storage)?;
//! cart.add(&emma[0], 1)?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod filter;
pub mod storage;

pub use cart::CartManager;
pub use catalog::CatalogClient;
pub use checkout::{CheckoutSession, PlacedOrder, whatsapp_url};
pub use config::StorefrontConfig;
pub use error::StorefrontError;
pub use filter::{DEFAULT_RELATED_LIMIT, FilterError, Occasion, PriceRange};
pub use storage::{DeviceStorage, FileStorage, MemoryStorage, Namespaced, StorageError};
