//! Core types for Lima Rose.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod product;
pub mod role;
pub mod section;
pub mod stats;

pub use id::*;
pub use price::{CurrencyCode, Price};
pub use product::{NewProduct, Product, ProductPatch};
pub use role::AdminRole;
pub use section::{Section, SectionError};
pub use stats::CatalogStats;
