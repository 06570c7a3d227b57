//! Localization catalog.

pub mod catalog;

pub use catalog::{Catalog, CatalogError};
