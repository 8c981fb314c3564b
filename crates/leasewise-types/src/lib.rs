//! # leasewise-types
//!
//! Core type definitions for the leasewise VM rightsizing advisor.
//!
//! This crate is the foundation of the dependency graph -- all other
//! leasewise crates depend on it. It contains:
//!
//! - **[`error`]** -- [`LeasewiseError`] and the crate-wide [`Result`] alias
//! - **[`config`]** -- TOML + environment configuration
//! - **[`model`]** -- VM records, catalog entries, recommendation rows

pub mod config;
pub mod error;
pub mod model;

pub use config::{Config, SearchConfig};
pub use error::{LeasewiseError, Result};
pub use model::{CatalogEntry, RecommendationRecord, VmRecord};
