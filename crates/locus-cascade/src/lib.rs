//! # locus-cascade
//!
//! Cascading location selection on top of a [`locus_catalog::CatalogClient`].
//!
//! ## Components
//!
//! - [`ScopedCache`] - per-level, per-scope read-through cache with request coalescing
//! - [`CascadeController`] - owns the region/locality/postal-code selections and
//!   keeps them consistent as upper levels change
//! - [`OptionWidget`] - searchable single-select state used for each level
//! - [`QuickSearchController`] - debounced free-text search that yields a full
//!   location triple, bypassing the cascade
//! - [`LocationSelector`] / [`LocationQuickSearch`] - the surfaces screens embed
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use locus_cascade::{CascadeController, SelectionState};
//!
//! let controller = CascadeController::new(Arc::new(catalog));
//! controller.mount(SelectionState::new("mh", "Pune", "")).await;
//! controller.select_postal_code("411002");
//! ```

pub mod cache;
pub mod controller;
pub mod events;
pub mod quick_search;
pub mod selection;
pub mod selector;
pub mod widget;

pub use cache::{CacheEntry, CacheStats, PostalScope, ScopedCache};
pub use controller::{CascadeCacheStats, CascadeController, CascadeView, LoadingFlags};
pub use events::{NoopObserver, SelectionCallbacks, SelectionChange, SelectionObserver};
pub use quick_search::{QuickSearchController, QuickSearchView, SearchConfig};
pub use selection::SelectionState;
pub use selector::{Level, LocationQuickSearch, LocationSelector};
pub use widget::{NO_OPTIONS_TEXT, OptionWidget, SelectOption, WidgetView, filter_options};
