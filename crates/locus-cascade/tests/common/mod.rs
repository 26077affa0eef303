//! Scripted catalog for cascade tests.
//!
//! Wraps an [`InMemoryCatalog`] and adds per-call counters, per-call delays
//! and injected failures. Delays use `tokio::time::sleep`, so tests running
//! with a paused clock stay deterministic.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use locus_catalog::{
    CatalogClient, CatalogDataset, CatalogError, CatalogOperation, InMemoryCatalog,
    LocationRecord, Region, RegionEntry, SubRegion,
};

#[derive(Default)]
struct Script {
    calls: Vec<String>,
    finished: Vec<String>,
    delays: HashMap<String, Duration>,
    failures: HashSet<String>,
}

pub struct ScriptedCatalog {
    inner: InMemoryCatalog,
    script: Mutex<Script>,
}

impl ScriptedCatalog {
    pub fn new(dataset: CatalogDataset) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryCatalog::new(dataset),
            script: Mutex::new(Script::default()),
        })
    }

    /// Delay every call whose key equals `key`, e.g. `"localities:mh"`.
    pub fn delay(&self, key: &str, delay: Duration) {
        self.script
            .lock()
            .unwrap()
            .delays
            .insert(key.to_string(), delay);
    }

    pub fn fail(&self, key: &str) {
        self.script.lock().unwrap().failures.insert(key.to_string());
    }

    pub fn recover(&self, key: &str) {
        self.script.lock().unwrap().failures.remove(key);
    }

    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn count(&self, key: &str) -> usize {
        self.script
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| *c == key)
            .count()
    }

    /// Keys of calls that ran to completion, in completion order.
    pub fn finished(&self) -> Vec<String> {
        self.script.lock().unwrap().finished.clone()
    }

    pub fn total_calls(&self) -> usize {
        self.script.lock().unwrap().calls.len()
    }

    async fn enter(&self, key: String, operation: CatalogOperation) -> Result<(), CatalogError> {
        let (delay, failing) = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(key.clone());
            (
                script.delays.get(&key).copied(),
                script.failures.contains(&key),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.script.lock().unwrap().finished.push(key.clone());
        if failing {
            return Err(CatalogError::unavailable(operation, format!("{key} scripted failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogClient for ScriptedCatalog {
    async fn list_regions(&self) -> Result<Vec<Region>, CatalogError> {
        self.enter("regions".into(), CatalogOperation::ListRegions)
            .await?;
        self.inner.list_regions().await
    }

    async fn list_sub_regions(&self, region_id: &str) -> Result<Vec<SubRegion>, CatalogError> {
        self.enter(
            format!("sub_regions:{region_id}"),
            CatalogOperation::ListSubRegions,
        )
        .await?;
        self.inner.list_sub_regions(region_id).await
    }

    async fn list_localities(&self, region_id: &str) -> Result<Vec<String>, CatalogError> {
        self.enter(
            format!("localities:{region_id}"),
            CatalogOperation::ListLocalities,
        )
        .await?;
        self.inner.list_localities(region_id).await
    }

    async fn list_postal_codes(
        &self,
        region_id: &str,
        locality: &str,
    ) -> Result<Vec<String>, CatalogError> {
        self.enter(
            format!("postal_codes:{region_id}:{locality}"),
            CatalogOperation::ListPostalCodes,
        )
        .await?;
        self.inner.list_postal_codes(region_id, locality).await
    }

    async fn search(&self, text: &str) -> Result<Vec<LocationRecord>, CatalogError> {
        self.enter(format!("search:{text}"), CatalogOperation::Search)
            .await?;
        self.inner.search(text).await
    }
}

/// Maharashtra with Mumbai and Pune, as used by the end-to-end scenarios.
pub fn maharashtra() -> CatalogDataset {
    CatalogDataset::default().with_region(
        RegionEntry::new("mh", "Maharashtra")
            .with_sub_regions(["Mumbai Suburban", "Pune District"])
            .with_locality("Mumbai", ["400001", "400002"])
            .with_locality("Pune", ["411001", "411002"]),
    )
}

/// Regions A = {X, Y}, A2 = {Y, Z}, B = {Z}.
pub fn overlapping() -> CatalogDataset {
    CatalogDataset::default()
        .with_region(
            RegionEntry::new("a", "Alpha")
                .with_sub_regions(["North", "South"])
                .with_locality("X", ["100", "101"])
                .with_locality("Y", ["200", "201"]),
        )
        .with_region(
            RegionEntry::new("a2", "Alpha Two")
                .with_sub_regions(["North"])
                .with_locality("Y", ["200", "299"])
                .with_locality("Z", ["300"]),
        )
        .with_region(RegionEntry::new("b", "Beta").with_locality("Z", ["900"]))
}

/// Records selection callbacks as `"level=value"` strings.
#[derive(Clone, Default)]
pub struct CallbackLog(Arc<Mutex<Vec<String>>>);

impl CallbackLog {
    pub fn callbacks(&self) -> locus_cascade::SelectionCallbacks {
        let (a, b, c, d) = (self.clone(), self.clone(), self.clone(), self.clone());
        locus_cascade::SelectionCallbacks::new()
            .on_region_change(move |v| a.push("region", v))
            .on_sub_region_change(move |v| b.push("sub_region", v))
            .on_locality_change(move |v| c.push("locality", v))
            .on_postal_code_change(move |v| d.push("postal_code", v))
    }

    fn push(&self, level: &str, value: Option<&str>) {
        self.0
            .lock()
            .unwrap()
            .push(format!("{level}={}", value.unwrap_or("")));
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}
