//! # locus-catalog
//!
//! Data model and catalog access for the Locus location hierarchy.
//!
//! The catalog is the only network boundary of the location subsystem. It
//! exposes four hierarchy levels (region, sub-region, locality, postal code)
//! plus a free-text search that returns complete location records.
//!
//! ## Overview
//!
//! The main trait is [`CatalogClient`]. Two implementations ship with this crate:
//! - [`HttpCatalogClient`] - talks to a remote catalog service over HTTP
//! - [`InMemoryCatalog`] - serves a static [`CatalogDataset`], used offline and in tests
//!
//! ## Example
//!
//! ```ignore
//! use locus_catalog::{CatalogClient, CatalogConfig, HttpCatalogClient};
//!
//! let client = HttpCatalogClient::new(&CatalogConfig::default())?;
//! let regions = client.list_regions().await?;
//! let localities = client.list_localities(&regions[0].id).await?;
//! ```

mod client;
mod error;
pub mod http;
pub mod memory;
mod types;

pub use client::{CatalogClient, DynCatalog};
pub use error::{CatalogError, CatalogOperation};
pub use http::{CatalogConfig, HttpCatalogClient};
pub use memory::{CatalogDataset, InMemoryCatalog, LocalityEntry, RegionEntry};
pub use types::{LocationRecord, MAX_SEARCH_RESULTS, Region, SubRegion};

/// Type alias for a catalog result.
pub type CatalogResult<T> = Result<T, CatalogError>;
