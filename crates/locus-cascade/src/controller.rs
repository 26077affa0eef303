//! Cascade controller: owns the dependent selections and their option lists.
//!
//! # Transitions
//!
//! - **Region changes**: the sub-region, locality and postal-code option lists
//!   are cleared and sub-regions and localities load in parallel. Selected
//!   values below the region are only cleared once the new lists arrive and
//!   do not contain them.
//! - **Locality changes**: postal codes for `(region, locality)` load; the
//!   selected postal code is cleared only if the new list lacks it.
//! - **Postal code / sub-region changes**: terminal, nothing loads.
//! - **Mount**: the supplied [`SelectionState`] is shown as-is while regions,
//!   localities and postal codes load, then validated against them.
//!
//! # Stale responses
//!
//! Every region change bumps a region generation and every locality change a
//! locality generation. A load captures the generations current when it was
//! issued and its result is dropped if they moved on in the meantime.
//!
//! # Failures
//!
//! A failed load leaves its option list empty with the loading flag cleared;
//! the selection at that level is left alone. Re-selecting the parent retries.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use locus_catalog::{CatalogError, DynCatalog, Region};
use tokio::sync::{OnceCell, watch};

use crate::cache::{CacheStats, PostalScope, ScopedCache};
use crate::events::{NoopObserver, SelectionChange, SelectionObserver, dispatch};
use crate::selection::{SelectionState, non_empty};

/// Independent loading flags, one per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingFlags {
    pub regions: bool,
    pub sub_regions: bool,
    pub localities: bool,
    pub postal_codes: bool,
}

/// Snapshot of everything a location selector needs to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeView {
    pub selection: SelectionState,
    pub sub_region: Option<String>,
    pub regions: Arc<[Region]>,
    pub sub_regions: Arc<[String]>,
    pub localities: Arc<[String]>,
    pub postal_codes: Arc<[String]>,
    pub loading: LoadingFlags,
}

impl Default for CascadeView {
    fn default() -> Self {
        Self {
            selection: SelectionState::default(),
            sub_region: None,
            regions: Arc::from([]),
            sub_regions: Arc::from([]),
            localities: Arc::from([]),
            postal_codes: Arc::from([]),
            loading: LoadingFlags::default(),
        }
    }
}

/// Cache statistics for the three scoped caches of one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeCacheStats {
    pub sub_regions: CacheStats,
    pub localities: CacheStats,
    pub postal_codes: CacheStats,
}

#[derive(Debug, Default)]
struct CascadeState {
    view: CascadeView,
    region_generation: u64,
    locality_generation: u64,
}

/// Generations captured when a load was issued.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Issued {
    region: u64,
    locality: u64,
}

/// Drives the region → locality → postal-code cascade.
///
/// Each instance owns its caches; nothing is shared between controllers.
/// All methods take `&self`, so concurrent selections from several tasks
/// (or `tokio::join!`) are fine; ordering is enforced by generations.
pub struct CascadeController {
    catalog: DynCatalog,
    observer: Arc<dyn SelectionObserver>,
    regions: OnceCell<Arc<[Region]>>,
    sub_regions: ScopedCache<String>,
    localities: ScopedCache<String>,
    postal_codes: ScopedCache<PostalScope>,
    state: Mutex<CascadeState>,
    view_tx: watch::Sender<CascadeView>,
}

impl CascadeController {
    /// Create a controller that reports changes nowhere.
    pub fn new(catalog: DynCatalog) -> Self {
        Self::with_observer(catalog, Arc::new(NoopObserver))
    }

    /// Create a controller that reports selection changes to `observer`.
    pub fn with_observer(catalog: DynCatalog, observer: Arc<dyn SelectionObserver>) -> Self {
        let (view_tx, _) = watch::channel(CascadeView::default());
        Self {
            catalog,
            observer,
            regions: OnceCell::new(),
            sub_regions: ScopedCache::new("sub_regions"),
            localities: ScopedCache::new("localities"),
            postal_codes: ScopedCache::new("postal_codes"),
            state: Mutex::new(CascadeState::default()),
            view_tx,
        }
    }

    /// Current selections.
    pub fn selection(&self) -> SelectionState {
        self.lock().view.selection.clone()
    }

    /// Current render snapshot.
    pub fn view(&self) -> CascadeView {
        self.lock().view.clone()
    }

    /// Receives a new snapshot after every applied change.
    pub fn subscribe(&self) -> watch::Receiver<CascadeView> {
        self.view_tx.subscribe()
    }

    pub fn cache_stats(&self) -> CascadeCacheStats {
        CascadeCacheStats {
            sub_regions: self.sub_regions.stats(),
            localities: self.localities.stats(),
            postal_codes: self.postal_codes.stats(),
        }
    }

    /// Hydrates the controller with a previously stored selection.
    ///
    /// The supplied values are visible immediately and stay visible while the
    /// lists load. Once regions, localities and postal codes resolve, values
    /// that are not members of their lists are cleared (and reported), exactly
    /// as if the user had driven the cascade by hand.
    pub async fn mount(&self, initial: SelectionState) {
        let issued = self.begin_mount(initial);
        self.finish_mount(issued).await;
    }

    /// Applies the stored selection and publishes it; loading happens in
    /// [`finish_mount`](Self::finish_mount).
    pub(crate) fn begin_mount(&self, initial: SelectionState) -> Issued {
        let initial = initial.normalized();
        tracing::debug!(?initial, "mounting location cascade");

        let mut state = self.lock();
        state.region_generation += 1;
        state.locality_generation += 1;
        state.view.selection = initial;
        state.view.sub_region = None;
        state.view.sub_regions = Arc::from([]);
        state.view.localities = Arc::from([]);
        state.view.postal_codes = Arc::from([]);
        state.view.loading = LoadingFlags {
            regions: true,
            ..LoadingFlags::default()
        };
        self.publish(&state);
        state.issued()
    }

    pub(crate) async fn finish_mount(&self, issued: Issued) {
        let regions = self.load_regions().await;

        let (region_id, changes) = {
            let mut state = self.lock();
            if state.region_generation != issued.region {
                tracing::debug!("selection changed during mount, skipping hydration");
                return;
            }
            let mut changes = Vec::new();
            if let Some(regions) = &regions {
                let known = state
                    .view
                    .selection
                    .region_id
                    .as_ref()
                    .is_none_or(|id| regions.iter().any(|r| &r.id == id));
                if !known {
                    tracing::warn!(
                        region_id = ?state.view.selection.region_id,
                        "stored region is not in the catalog, clearing selection"
                    );
                    state.clear_region(&mut changes);
                }
            }
            if state.view.selection.region_id.is_some() {
                state.view.loading.sub_regions = true;
                state.view.loading.localities = true;
            }
            self.publish(&state);
            (state.view.selection.region_id.clone(), changes)
        };
        dispatch(self.observer.as_ref(), changes);

        if let Some(region_id) = region_id {
            self.resolve_region(&region_id, issued).await;
        }
    }

    /// Selects a region; an empty id clears the region and everything below.
    ///
    /// Ids not present in the loaded region list are ignored. Re-selecting the
    /// current region reloads its lists through the cache, which retries any
    /// level whose previous load failed.
    pub async fn select_region(&self, region_id: &str) {
        if let Some((region_id, issued)) = self.begin_region(region_id) {
            self.resolve_region(&region_id, issued).await;
        }
    }

    /// Applies a region selection. Returns the region whose lists must be
    /// loaded, if any.
    pub(crate) fn begin_region(&self, region_id: &str) -> Option<(String, Issued)> {
        let region_id = non_empty(region_id);

        let (issued, changes) = {
            let mut state = self.lock();
            if let Some(id) = &region_id
                && !state.view.regions.iter().any(|r| &r.id == id)
            {
                tracing::warn!(region_id = %id, "ignoring selection of unknown region");
                return None;
            }

            let mut changes = Vec::new();
            state.region_generation += 1;
            state.locality_generation += 1;
            state.view.sub_regions = Arc::from([]);
            state.view.localities = Arc::from([]);
            state.view.postal_codes = Arc::from([]);
            state.view.loading.postal_codes = false;

            match &region_id {
                Some(_) => {
                    if state.view.selection.region_id != region_id {
                        state.view.selection.region_id = region_id.clone();
                        changes.push(SelectionChange::Region(region_id.clone()));
                    }
                    state.view.loading.sub_regions = true;
                    state.view.loading.localities = true;
                }
                None => state.clear_region(&mut changes),
            }
            self.publish(&state);
            (state.issued(), changes)
        };
        dispatch(self.observer.as_ref(), changes);
        region_id.map(|id| (id, issued))
    }

    /// Selects a sub-region of the current region. Informational only: the
    /// locality list is not filtered by it.
    pub fn select_sub_region(&self, sub_region: &str) {
        let sub_region = non_empty(sub_region);
        let changes = {
            let mut state = self.lock();
            if let Some(name) = &sub_region
                && !state.view.sub_regions.contains(name)
            {
                tracing::warn!(sub_region = %name, "ignoring selection of unknown sub-region");
                return;
            }
            if state.view.sub_region == sub_region {
                return;
            }
            state.view.sub_region = sub_region.clone();
            self.publish(&state);
            vec![SelectionChange::SubRegion(sub_region)]
        };
        dispatch(self.observer.as_ref(), changes);
    }

    /// Selects a locality of the current region; an empty name clears the
    /// locality and postal code.
    pub async fn select_locality(&self, locality: &str) {
        if let Some((region_id, locality, issued)) = self.begin_locality(locality) {
            self.refresh_postal_codes(&region_id, &locality, issued).await;
        }
    }

    /// Applies a locality selection. Returns the postal-code scope that must
    /// be loaded, if any.
    pub(crate) fn begin_locality(&self, locality: &str) -> Option<(String, String, Issued)> {
        let locality = non_empty(locality);

        let (target, changes) = {
            let mut state = self.lock();
            let Some(region_id) = state.view.selection.region_id.clone() else {
                tracing::warn!(?locality, "ignoring locality selection without a region");
                return None;
            };
            if let Some(name) = &locality
                && !state.view.localities.contains(name)
            {
                tracing::warn!(%region_id, locality = %name, "ignoring selection of unknown locality");
                return None;
            }

            let mut changes = Vec::new();
            state.locality_generation += 1;
            state.view.postal_codes = Arc::from([]);
            if state.view.selection.locality != locality {
                state.view.selection.locality = locality.clone();
                changes.push(SelectionChange::Locality(locality.clone()));
            }
            let target = match locality {
                Some(name) => {
                    state.view.loading.postal_codes = true;
                    Some((region_id, name, state.issued()))
                }
                None => {
                    state.view.loading.postal_codes = false;
                    state.clear_postal_code(&mut changes);
                    None
                }
            };
            self.publish(&state);
            (target, changes)
        };
        dispatch(self.observer.as_ref(), changes);
        target
    }

    /// Selects a postal code of the current locality. Terminal: nothing loads.
    pub fn select_postal_code(&self, postal_code: &str) {
        let postal_code = non_empty(postal_code);
        let changes = {
            let mut state = self.lock();
            if let Some(code) = &postal_code
                && !state.view.postal_codes.contains(code)
            {
                tracing::warn!(postal_code = %code, "ignoring selection of unknown postal code");
                return;
            }
            if state.view.selection.postal_code == postal_code {
                return;
            }
            state.view.selection.postal_code = postal_code.clone();
            self.publish(&state);
            vec![SelectionChange::PostalCode(postal_code)]
        };
        dispatch(self.observer.as_ref(), changes);
    }

    /// Loads the region list once per controller. Failures are not memoised.
    async fn load_regions(&self) -> Option<Arc<[Region]>> {
        let result = self
            .regions
            .get_or_try_init(|| async {
                let regions = self.catalog.list_regions().await?;
                Ok::<_, CatalogError>(Arc::from(regions))
            })
            .await
            .cloned();

        let mut state = self.lock();
        state.view.loading.regions = false;
        let regions = match result {
            Ok(regions) => {
                state.view.regions = regions.clone();
                Some(regions)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load regions");
                state.view.regions = Arc::from([]);
                None
            }
        };
        self.publish(&state);
        regions
    }

    pub(crate) async fn resolve_region(&self, region_id: &str, issued: Issued) {
        tokio::join!(
            self.refresh_sub_regions(region_id, issued),
            self.refresh_localities(region_id, issued),
        );
    }

    async fn refresh_sub_regions(&self, region_id: &str, issued: Issued) {
        let catalog = self.catalog.clone();
        let id = region_id.to_string();
        let result = self
            .sub_regions
            .get_or_load(region_id.to_string(), move || async move {
                let sub_regions = catalog.list_sub_regions(&id).await?;
                Ok::<_, CatalogError>(sub_regions.into_iter().map(|s| s.name).collect::<Vec<_>>())
            })
            .await;

        let changes = {
            let mut state = self.lock();
            if state.region_generation != issued.region {
                tracing::debug!(region_id, "dropping stale sub-region response");
                return;
            }
            let mut changes = Vec::new();
            state.view.loading.sub_regions = false;
            match result {
                Ok(sub_regions) => {
                    if let Some(name) = &state.view.sub_region
                        && !sub_regions.contains(name)
                    {
                        state.view.sub_region = None;
                        changes.push(SelectionChange::SubRegion(None));
                    }
                    state.view.sub_regions = sub_regions;
                }
                Err(e) => {
                    tracing::warn!(region_id, error = %e, "failed to load sub-regions");
                    state.view.sub_regions = Arc::from([]);
                }
            }
            self.publish(&state);
            changes
        };
        dispatch(self.observer.as_ref(), changes);
    }

    async fn refresh_localities(&self, region_id: &str, issued: Issued) {
        let catalog = self.catalog.clone();
        let id = region_id.to_string();
        let result = self
            .localities
            .get_or_load(region_id.to_string(), move || async move {
                catalog.list_localities(&id).await
            })
            .await;

        let (follow_up, changes) = {
            let mut state = self.lock();
            if state.region_generation != issued.region {
                tracing::debug!(region_id, "dropping stale locality response");
                return;
            }
            let mut changes = Vec::new();
            let mut follow_up = None;
            state.view.loading.localities = false;
            match result {
                Ok(localities) => {
                    match state.view.selection.locality.clone() {
                        Some(name) if localities.contains(&name) => {
                            state.view.loading.postal_codes = true;
                            follow_up = Some(name);
                        }
                        Some(name) => {
                            tracing::debug!(region_id, locality = %name, "locality not in region, clearing");
                            state.view.selection.locality = None;
                            changes.push(SelectionChange::Locality(None));
                            state.clear_postal_code(&mut changes);
                        }
                        None => state.clear_postal_code(&mut changes),
                    }
                    state.view.localities = localities;
                }
                Err(e) => {
                    tracing::warn!(region_id, error = %e, "failed to load localities");
                    state.view.localities = Arc::from([]);
                }
            }
            self.publish(&state);
            (follow_up, changes)
        };
        dispatch(self.observer.as_ref(), changes);

        if let Some(locality) = follow_up {
            self.refresh_postal_codes(region_id, &locality, issued).await;
        }
    }

    pub(crate) async fn refresh_postal_codes(&self, region_id: &str, locality: &str, issued: Issued) {
        let catalog = self.catalog.clone();
        let scope = PostalScope::new(region_id, locality);
        let key = scope.clone();
        let result = self
            .postal_codes
            .get_or_load(key, move || async move {
                catalog
                    .list_postal_codes(&scope.region_id, &scope.locality)
                    .await
            })
            .await;

        let changes = {
            let mut state = self.lock();
            if state.region_generation != issued.region
                || state.locality_generation != issued.locality
            {
                tracing::debug!(region_id, locality, "dropping stale postal-code response");
                return;
            }
            let mut changes = Vec::new();
            state.view.loading.postal_codes = false;
            match result {
                Ok(postal_codes) => {
                    if let Some(code) = &state.view.selection.postal_code
                        && !postal_codes.contains(code)
                    {
                        tracing::debug!(region_id, locality, postal_code = %code, "postal code not in locality, clearing");
                        state.clear_postal_code(&mut changes);
                    }
                    state.view.postal_codes = postal_codes;
                }
                Err(e) => {
                    tracing::warn!(region_id, locality, error = %e, "failed to load postal codes");
                    state.view.postal_codes = Arc::from([]);
                }
            }
            self.publish(&state);
            changes
        };
        dispatch(self.observer.as_ref(), changes);
    }

    fn publish(&self, state: &CascadeState) {
        self.view_tx.send_replace(state.view.clone());
    }

    fn lock(&self) -> MutexGuard<'_, CascadeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CascadeState {
    fn issued(&self) -> Issued {
        Issued {
            region: self.region_generation,
            locality: self.locality_generation,
        }
    }

    /// Clears the region and every level below it.
    fn clear_region(&mut self, changes: &mut Vec<SelectionChange>) {
        if self.view.selection.region_id.take().is_some() {
            changes.push(SelectionChange::Region(None));
        }
        if self.view.sub_region.take().is_some() {
            changes.push(SelectionChange::SubRegion(None));
        }
        if self.view.selection.locality.take().is_some() {
            changes.push(SelectionChange::Locality(None));
        }
        self.clear_postal_code(changes);
        self.view.loading.sub_regions = false;
        self.view.loading.localities = false;
        self.view.loading.postal_codes = false;
    }

    fn clear_postal_code(&mut self, changes: &mut Vec<SelectionChange>) {
        if self.view.selection.postal_code.take().is_some() {
            changes.push(SelectionChange::PostalCode(None));
        }
    }
}

impl fmt::Debug for CascadeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascadeController")
            .field("selection", &self.selection())
            .field("sub_regions", &self.sub_regions)
            .field("localities", &self.localities)
            .field("postal_codes", &self.postal_codes)
            .finish_non_exhaustive()
    }
}
