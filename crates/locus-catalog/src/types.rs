//! Location hierarchy types shared by every catalog implementation.

use serde::{Deserialize, Serialize};

/// Maximum number of records a catalog search may return.
pub const MAX_SEARCH_RESULTS: usize = 10;

/// Top-level geographic division (a state or province).
///
/// Regions are identified by `id`; `name` is for display only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// Opaque, stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Region {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Second-level division within a region (a district).
///
/// Has no identifier of its own; it is identified by `(region id, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubRegion {
    pub name: String,
}

impl SubRegion {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A complete location triple as returned by free-text search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    /// Region display name.
    pub region: String,
    /// Locality name within the region.
    pub locality: String,
    /// Postal code within the locality.
    pub postal_code: String,
}

impl LocationRecord {
    pub fn new(
        region: impl Into<String>,
        locality: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            locality: locality.into(),
            postal_code: postal_code.into(),
        }
    }

    /// Single-line label used by search result lists.
    pub fn label(&self) -> String {
        format!("{}, {} - {}", self.locality, self.region, self.postal_code)
    }
}
