//! Lima Rose admin library.
//!
//! The catalog JSON API as a library, so the binary, the CLI and the
//! integration tests all build the same router.
//!
//! # Security
//!
//! Catalog mutations and uploads require a signed admin token. Reads are
//! public. There is one admin identity, configured through the environment.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use config::{AdminConfig, AuthConfig, ConfigError, LogFormat};
pub use error::AppError;
pub use routes::app;
pub use state::AppState;
pub use store::{ProductStore, StoreError};
