//! In-memory catalog backed by a static dataset.
//!
//! Used for offline operation (the CLI's `--data` flag) and as the backing
//! store for scripted catalogs in tests.
//!
//! # Example
//!
//! ```
//! use locus_catalog::{CatalogDataset, InMemoryCatalog, RegionEntry};
//!
//! let dataset = CatalogDataset::default().with_region(
//!     RegionEntry::new("mh", "Maharashtra")
//!         .with_locality("Mumbai", ["400001"])
//!         .with_locality("Pune", ["411001", "411002"]),
//! );
//! let catalog = InMemoryCatalog::new(dataset);
//! assert_eq!(catalog.dataset().regions.len(), 1);
//! ```

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::CatalogResult;
use crate::client::CatalogClient;
use crate::error::CatalogError;
use crate::types::{LocationRecord, MAX_SEARCH_RESULTS, Region, SubRegion};

/// A locality and its postal codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalityEntry {
    pub name: String,
    #[serde(default)]
    pub postal_codes: Vec<String>,
}

/// A region with its sub-regions and localities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sub_regions: Vec<String>,
    #[serde(default)]
    pub localities: Vec<LocalityEntry>,
}

impl RegionEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_sub_regions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_regions.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_locality<I, S>(mut self, name: impl Into<String>, postal_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.localities.push(LocalityEntry {
            name: name.into(),
            postal_codes: postal_codes.into_iter().map(Into::into).collect(),
        });
        self
    }

    fn locality(&self, name: &str) -> Option<&LocalityEntry> {
        self.localities.iter().find(|l| l.name == name)
    }
}

/// The full location hierarchy served by [`InMemoryCatalog`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDataset {
    #[serde(default)]
    pub regions: Vec<RegionEntry>,
}

impl CatalogDataset {
    #[must_use]
    pub fn with_region(mut self, region: RegionEntry) -> Self {
        self.regions.push(region);
        self
    }

    /// Parse a dataset from its JSON representation.
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        serde_json::from_str(json).map_err(|e| CatalogError::config(format!("invalid dataset: {e}")))
    }

    /// Read a dataset from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::config(format!("failed to read dataset {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    fn region(&self, region_id: &str) -> Option<&RegionEntry> {
        self.regions.iter().find(|r| r.id == region_id)
    }
}

/// Catalog serving a fixed [`CatalogDataset`].
///
/// Unknown region ids and locality names yield empty lists, never errors.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    dataset: CatalogDataset,
}

impl InMemoryCatalog {
    pub fn new(dataset: CatalogDataset) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &CatalogDataset {
        &self.dataset
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalog {
    async fn list_regions(&self) -> CatalogResult<Vec<Region>> {
        Ok(self
            .dataset
            .regions
            .iter()
            .map(|r| Region::new(&r.id, &r.name))
            .collect())
    }

    async fn list_sub_regions(&self, region_id: &str) -> CatalogResult<Vec<SubRegion>> {
        Ok(self
            .dataset
            .region(region_id)
            .map(|r| r.sub_regions.iter().map(SubRegion::new).collect())
            .unwrap_or_default())
    }

    async fn list_localities(&self, region_id: &str) -> CatalogResult<Vec<String>> {
        Ok(self
            .dataset
            .region(region_id)
            .map(|r| r.localities.iter().map(|l| l.name.clone()).collect())
            .unwrap_or_default())
    }

    async fn list_postal_codes(
        &self,
        region_id: &str,
        locality: &str,
    ) -> CatalogResult<Vec<String>> {
        Ok(self
            .dataset
            .region(region_id)
            .and_then(|r| r.locality(locality))
            .map(|l| l.postal_codes.clone())
            .unwrap_or_default())
    }

    async fn search(&self, text: &str) -> CatalogResult<Vec<LocationRecord>> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for region in &self.dataset.regions {
            let region_hit = region.name.to_lowercase().contains(&needle);
            for locality in &region.localities {
                let locality_hit = region_hit || locality.name.to_lowercase().contains(&needle);
                for code in &locality.postal_codes {
                    if locality_hit || code.to_lowercase().contains(&needle) {
                        records.push(LocationRecord::new(&region.name, &locality.name, code));
                        if records.len() == MAX_SEARCH_RESULTS {
                            return Ok(records);
                        }
                    }
                }
            }
        }
        Ok(records)
    }
}
