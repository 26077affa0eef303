//! Catalog error types.

use std::fmt;

/// The catalog operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogOperation {
    ListRegions,
    ListSubRegions,
    ListLocalities,
    ListPostalCodes,
    Search,
}

impl CatalogOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListRegions => "list_regions",
            Self::ListSubRegions => "list_sub_regions",
            Self::ListLocalities => "list_localities",
            Self::ListPostalCodes => "list_postal_codes",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for CatalogOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while talking to the catalog.
///
/// The type is `Clone` so that a single failed load can be handed to every
/// caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The catalog could not be reached, answered with a non-success status,
    /// or returned a body that could not be decoded.
    #[error("Catalog unavailable ({operation}): {message}")]
    Unavailable {
        /// Operation that failed.
        operation: CatalogOperation,
        /// Description of the failure.
        message: String,
    },

    /// The client could not be constructed from its configuration.
    #[error("Invalid catalog configuration: {0}")]
    Config(String),
}

impl CatalogError {
    /// Creates a new `Unavailable` error.
    #[must_use]
    pub fn unavailable(operation: CatalogOperation, message: impl Into<String>) -> Self {
        Self::Unavailable {
            operation,
            message: message.into(),
        }
    }

    /// Creates a new `Config` error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns the failed operation, if the error came from a catalog call.
    pub fn operation(&self) -> Option<CatalogOperation> {
        match self {
            Self::Unavailable { operation, .. } => Some(*operation),
            Self::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_display_names_operation() {
        let err = CatalogError::unavailable(CatalogOperation::ListLocalities, "HTTP 503");
        assert_eq!(
            err.to_string(),
            "Catalog unavailable (list_localities): HTTP 503"
        );
        assert_eq!(err.operation(), Some(CatalogOperation::ListLocalities));
    }

    #[test]
    fn config_error_has_no_operation() {
        assert_eq!(CatalogError::config("bad url").operation(), None);
    }
}
