//! The catalog access trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::CatalogResult;
use crate::types::{LocationRecord, Region, SubRegion};

/// Read access to the location catalog.
///
/// Every operation is atomic from the caller's point of view: it either
/// returns the complete list or fails with
/// [`CatalogError::Unavailable`](crate::CatalogError::Unavailable).
/// An empty list is a successful answer. Implementations never retry on
/// their own; retrying is the caller's decision.
///
/// # Example
///
/// ```ignore
/// use locus_catalog::{CatalogClient, CatalogError};
///
/// async fn first_locality(
///     catalog: &dyn CatalogClient,
///     region_id: &str,
/// ) -> Result<Option<String>, CatalogError> {
///     Ok(catalog.list_localities(region_id).await?.into_iter().next())
/// }
/// ```
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Lists every region, in catalog order.
    async fn list_regions(&self) -> CatalogResult<Vec<Region>>;

    /// Lists the sub-regions of a region.
    async fn list_sub_regions(&self, region_id: &str) -> CatalogResult<Vec<SubRegion>>;

    /// Lists all localities of a region. Not paginated.
    async fn list_localities(&self, region_id: &str) -> CatalogResult<Vec<String>>;

    /// Lists all postal codes of a locality within a region.
    async fn list_postal_codes(
        &self,
        region_id: &str,
        locality: &str,
    ) -> CatalogResult<Vec<String>>;

    /// Free-text search over region name, locality name and postal code.
    ///
    /// Matching is case-insensitive and returns at most
    /// [`MAX_SEARCH_RESULTS`](crate::MAX_SEARCH_RESULTS) records.
    async fn search(&self, text: &str) -> CatalogResult<Vec<LocationRecord>>;
}

/// Type alias for a shareable catalog client.
pub type DynCatalog = Arc<dyn CatalogClient>;
