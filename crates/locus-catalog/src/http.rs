//! HTTP catalog client.
//!
//! Talks to a remote catalog service using a small REST layout relative to
//! the configured base URL:
//!
//! | Operation           | Request                                            |
//! |---------------------|----------------------------------------------------|
//! | `list_regions`      | `GET regions`                                      |
//! | `list_sub_regions`  | `GET regions/{id}/sub-regions`                     |
//! | `list_localities`   | `GET regions/{id}/localities`                      |
//! | `list_postal_codes` | `GET regions/{id}/localities/{name}/postal-codes`  |
//! | `search`            | `GET search?q={text}&limit=10`                     |
//!
//! Any transport failure, non-2xx status or undecodable body is reported as
//! [`CatalogError::Unavailable`]. Requests are never retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::CatalogResult;
use crate::client::CatalogClient;
use crate::error::{CatalogError, CatalogOperation};
use crate::types::{LocationRecord, MAX_SEARCH_RESULTS, Region, SubRegion};

/// Default catalog service URL
const DEFAULT_BASE_URL: &str = "http://localhost:8080/catalog/";

/// Default request timeout: 10 seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the HTTP catalog client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the catalog service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CatalogConfig {
    /// Creates a configuration pointing at `base_url` with default timeout.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Catalog client backed by a remote HTTP service.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpCatalogClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] if the base URL cannot be parsed or
    /// cannot carry path segments, or if the HTTP client cannot be built.
    pub fn new(config: &CatalogConfig) -> CatalogResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| CatalogError::config(format!("invalid base URL {}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::config(format!(
                "base URL {} cannot carry a path",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CatalogError::config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new(), so this always succeeds
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: CatalogOperation,
        url: Url,
    ) -> CatalogResult<T> {
        tracing::debug!(%operation, %url, "catalog request");

        let resp = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| CatalogError::unavailable(operation, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::unavailable(
                operation,
                format!("HTTP {status}: {body}"),
            ));
        }

        resp.json::<T>()
            .await
            .map_err(|e| CatalogError::unavailable(operation, format!("malformed response: {e}")))
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn list_regions(&self) -> CatalogResult<Vec<Region>> {
        let url = self.endpoint(&["regions"]);
        self.fetch(CatalogOperation::ListRegions, url).await
    }

    async fn list_sub_regions(&self, region_id: &str) -> CatalogResult<Vec<SubRegion>> {
        let url = self.endpoint(&["regions", region_id, "sub-regions"]);
        self.fetch(CatalogOperation::ListSubRegions, url).await
    }

    async fn list_localities(&self, region_id: &str) -> CatalogResult<Vec<String>> {
        let url = self.endpoint(&["regions", region_id, "localities"]);
        self.fetch(CatalogOperation::ListLocalities, url).await
    }

    async fn list_postal_codes(
        &self,
        region_id: &str,
        locality: &str,
    ) -> CatalogResult<Vec<String>> {
        let url = self.endpoint(&["regions", region_id, "localities", locality, "postal-codes"]);
        self.fetch(CatalogOperation::ListPostalCodes, url).await
    }

    async fn search(&self, text: &str) -> CatalogResult<Vec<LocationRecord>> {
        let mut url = self.endpoint(&["search"]);
        url.query_pairs_mut()
            .append_pair("q", text)
            .append_pair("limit", &MAX_SEARCH_RESULTS.to_string());

        let mut records: Vec<LocationRecord> = self.fetch(CatalogOperation::Search, url).await?;
        records.truncate(MAX_SEARCH_RESULTS);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpCatalogClient {
        HttpCatalogClient::new(&CatalogConfig::with_base_url(base)).unwrap()
    }

    #[test]
    fn test_config_defaults_from_empty_object() {
        let config: CatalogConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CatalogConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_rejects_unparseable_base_url() {
        let err = HttpCatalogClient::new(&CatalogConfig::with_base_url("not a url")).unwrap_err();
        assert!(matches!(err, CatalogError::Config(_)));

        let err = HttpCatalogClient::new(&CatalogConfig::with_base_url("mailto:x@y.z")).unwrap_err();
        assert!(matches!(err, CatalogError::Config(_)));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let c = client("http://example.com/api/");
        assert_eq!(
            c.endpoint(&["regions", "mh", "localities"]).as_str(),
            "http://example.com/api/regions/mh/localities"
        );

        let c = client("http://example.com");
        assert_eq!(c.endpoint(&["regions"]).as_str(), "http://example.com/regions");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let c = client("http://example.com/");
        assert_eq!(
            c.endpoint(&["regions", "mh", "localities", "Navi Mumbai/East", "postal-codes"])
                .as_str(),
            "http://example.com/regions/mh/localities/Navi%20Mumbai%2FEast/postal-codes"
        );
    }
}
