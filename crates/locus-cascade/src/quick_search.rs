//! Debounced free-text location search.
//!
//! Bypasses the cascade: the user types free text, the catalog's search
//! endpoint answers with complete `(region, locality, postal code)` records,
//! and picking one emits the whole triple at once.
//!
//! ## Rules
//!
//! - Queries shorter than [`SearchConfig::min_query_chars`] clear the results
//!   immediately and never reach the catalog.
//! - Longer queries are searched after [`SearchConfig::debounce_ms`] of input
//!   inactivity; every keystroke restarts the timer.
//! - Every keystroke also advances a request token. A response is applied only
//!   if its token is still current, so the last submitted query wins even if
//!   an older search answers later.
//! - The debounce wait and the search it triggers run on one spawned task
//!   owned by the controller. New input, selection and teardown abort it, so
//!   a catalog call still in flight is dropped along with the timer.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use locus_catalog::{DynCatalog, LocationRecord, MAX_SEARCH_RESULTS};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default debounce interval: 300 ms
const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default minimum query length in characters
const DEFAULT_MIN_QUERY_CHARS: usize = 3;

/// Configuration for the quick-search controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Input inactivity before a search is issued, in milliseconds (default: 300)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Queries shorter than this never reach the catalog (default: 3)
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,

    /// Upper bound on displayed results (default: 10)
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_min_query_chars() -> usize {
    DEFAULT_MIN_QUERY_CHARS
}

fn default_max_results() -> usize {
    MAX_SEARCH_RESULTS
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_query_chars: default_min_query_chars(),
            max_results: default_max_results(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Render snapshot of the search box and its result list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuickSearchView {
    pub query: String,
    pub results: Vec<LocationRecord>,
    pub loading: bool,
    /// Trimmed query the current `results` answer, once a search settled.
    pub results_for: Option<String>,
}

#[derive(Debug, Default)]
struct SearchState {
    view: QuickSearchView,
    token: u64,
    closed: bool,
}

struct Inner {
    catalog: DynCatalog,
    config: SearchConfig,
    state: Mutex<SearchState>,
    view_tx: watch::Sender<QuickSearchView>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SearchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &SearchState) {
        self.view_tx.send_replace(state.view.clone());
    }

    async fn run_search(self: Arc<Self>, query: String, token: u64) {
        {
            let mut state = self.lock();
            if state.closed || state.token != token {
                return;
            }
            state.view.loading = true;
            self.publish(&state);
        }

        tracing::debug!(%query, token, "issuing location search");
        let result = self.catalog.search(&query).await;

        let mut state = self.lock();
        if state.closed || state.token != token {
            tracing::debug!(%query, token, current = state.token, "dropping stale search response");
            return;
        }
        state.view.loading = false;
        state.view.results_for = Some(query.clone());
        match result {
            Ok(mut records) => {
                records.truncate(self.config.max_results);
                state.view.results = records;
            }
            Err(e) => {
                tracing::warn!(%query, error = %e, "location search failed");
                state.view.results.clear();
            }
        }
        self.publish(&state);
    }
}

type LocationCallback = Box<dyn Fn(&LocationRecord) + Send + Sync>;

/// Debounced search over the catalog's full location records.
///
/// Must be used from within a Tokio runtime: [`input`](Self::input) spawns
/// the debounced search task.
pub struct QuickSearchController {
    inner: Arc<Inner>,
    search: Mutex<Option<JoinHandle<()>>>,
    on_select: Option<LocationCallback>,
}

impl QuickSearchController {
    pub fn new(catalog: DynCatalog, config: SearchConfig) -> Self {
        let (view_tx, _) = watch::channel(QuickSearchView::default());
        Self {
            inner: Arc::new(Inner {
                catalog,
                config,
                state: Mutex::new(SearchState::default()),
                view_tx,
            }),
            search: Mutex::new(None),
            on_select: None,
        }
    }

    /// Registers the consumer of selected records.
    #[must_use]
    pub fn with_on_select(mut self, f: impl Fn(&LocationRecord) + Send + Sync + 'static) -> Self {
        self.on_select = Some(Box::new(f));
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.inner.config
    }

    pub fn view(&self) -> QuickSearchView {
        self.inner.lock().view.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QuickSearchView> {
        self.inner.view_tx.subscribe()
    }

    /// Handles a change of the query text.
    pub fn input(&self, text: &str) {
        self.cancel_search();

        let query = text.trim().to_string();
        let token = {
            let mut state = self.inner.lock();
            if state.closed {
                return;
            }
            state.token += 1;
            state.view.query = text.to_string();
            state.view.loading = false;
            if query.chars().count() < self.inner.config.min_query_chars {
                state.view.results.clear();
                state.view.results_for = None;
                self.inner.publish(&state);
                return;
            }
            self.inner.publish(&state);
            state.token
        };

        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.config.debounce()).await;
            inner.run_search(query, token).await;
        });
        *self.lock_search() = Some(handle);
    }

    /// Picks the result at `index`, emitting it to the consumer.
    ///
    /// Clears the query and results in one step. Returns `None` (and emits
    /// nothing) if there is no such result.
    pub fn select(&self, index: usize) -> Option<LocationRecord> {
        let record = {
            let mut state = self.inner.lock();
            if state.closed {
                return None;
            }
            let record = state.view.results.get(index).cloned()?;
            state.token += 1;
            state.view = QuickSearchView::default();
            self.inner.publish(&state);
            record
        };
        self.cancel_search();

        tracing::debug!(?record, "location selected from search");
        if let Some(on_select) = &self.on_select {
            on_select(&record);
        }
        Some(record)
    }

    /// Stops the controller: cancels the pending or in-flight search.
    /// Further input is ignored.
    pub fn shutdown(&self) {
        self.cancel_search();
        let mut state = self.inner.lock();
        state.closed = true;
        state.token += 1;
    }

    fn cancel_search(&self) {
        if let Some(handle) = self.lock_search().take() {
            handle.abort();
        }
    }

    fn lock_search(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.search.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for QuickSearchController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for QuickSearchController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuickSearchController")
            .field("config", &self.inner.config)
            .field("view", &self.view())
            .finish_non_exhaustive()
    }
}
