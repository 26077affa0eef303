//! Selection state of the location cascade.

use serde::{Deserialize, Serialize};

/// The user's current choice at each dependent level.
///
/// `None` means "nothing selected". Empty strings supplied by callers are
/// normalised to `None`.
///
/// Invariant (upheld by [`CascadeController`](crate::CascadeController)): a
/// locality is only kept if it belongs to the locality list resolved for the
/// region, and a postal code only if it belongs to the list resolved for the
/// `(region, locality)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    #[serde(default)]
    pub region_id: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl SelectionState {
    pub fn new(region_id: &str, locality: &str, postal_code: &str) -> Self {
        Self {
            region_id: non_empty(region_id),
            locality: non_empty(locality),
            postal_code: non_empty(postal_code),
        }
    }

    #[must_use]
    pub fn with_region(mut self, region_id: &str) -> Self {
        self.region_id = non_empty(region_id);
        self
    }

    #[must_use]
    pub fn with_locality(mut self, locality: &str) -> Self {
        self.locality = non_empty(locality);
        self
    }

    #[must_use]
    pub fn with_postal_code(mut self, postal_code: &str) -> Self {
        self.postal_code = non_empty(postal_code);
        self
    }

    /// Drops empty strings that may have arrived through deserialization.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            region_id: self.region_id.filter(|s| !s.is_empty()),
            locality: self.locality.filter(|s| !s.is_empty()),
            postal_code: self.postal_code.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.region_id.is_none() && self.locality.is_none() && self.postal_code.is_none()
    }
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_mean_unset() {
        let state = SelectionState::new("mh", "", "");
        assert_eq!(state.region_id.as_deref(), Some("mh"));
        assert_eq!(state.locality, None);
        assert_eq!(state.postal_code, None);
        assert!(SelectionState::new("", "", "").is_empty());
    }

    #[test]
    fn normalized_drops_deserialized_empty_strings() {
        let state: SelectionState =
            serde_json::from_str(r#"{"regionId":"mh","locality":"","postalCode":"411002"}"#)
                .unwrap();
        let state = state.normalized();
        assert_eq!(state, SelectionState::new("mh", "", "411002"));
    }
}
