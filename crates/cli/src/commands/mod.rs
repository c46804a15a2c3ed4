//! CLI command implementations.

pub mod auth;
pub mod catalog;
