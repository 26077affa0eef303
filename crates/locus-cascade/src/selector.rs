//! Embeddable location components.
//!
//! - [`LocationSelector`]: dependent dropdowns (region, sub-region, locality,
//!   postal code) driven by a [`CascadeController`].
//! - [`LocationQuickSearch`]: one search box whose results are complete
//!   location triples, driven by a [`QuickSearchController`].
//!
//! Screens embed these and learn about changes only through the callbacks
//! they pass in. No error ever reaches the screen; failures show up as empty
//! option lists.

use std::sync::Arc;

use locus_catalog::{DynCatalog, LocationRecord};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::controller::{CascadeController, CascadeView};
use crate::events::SelectionCallbacks;
use crate::quick_search::{QuickSearchController, QuickSearchView, SearchConfig};
use crate::selection::SelectionState;
use crate::widget::{OptionWidget, SelectOption};

/// One dropdown of a [`LocationSelector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Region,
    SubRegion,
    Locality,
    PostalCode,
}

/// Dependent location dropdowns.
///
/// The selector owns one [`OptionWidget`] per level. A pick is applied to
/// the controller right away and the loads it triggers run on spawned tasks,
/// so the widgets show loading flags and stored values while lists arrive.
/// The embedding UI drives redraws with [`changed`](Self::changed), or waits
/// for every pending load with [`settled`](Self::settled).
///
/// Must be used from within a Tokio runtime. Dropping the selector aborts
/// pending loads.
#[derive(Debug)]
pub struct LocationSelector {
    controller: Arc<CascadeController>,
    views: watch::Receiver<CascadeView>,
    pending: Vec<JoinHandle<()>>,
    disabled: bool,
    region: OptionWidget,
    sub_region: OptionWidget,
    locality: OptionWidget,
    postal_code: OptionWidget,
}

impl LocationSelector {
    pub fn new(catalog: DynCatalog, callbacks: SelectionCallbacks) -> Self {
        let controller = Arc::new(CascadeController::with_observer(
            catalog,
            Arc::new(callbacks),
        ));
        let views = controller.subscribe();
        Self {
            controller,
            views,
            pending: Vec::new(),
            disabled: false,
            region: OptionWidget::new("Select state"),
            sub_region: OptionWidget::new("Select district"),
            locality: OptionWidget::new("Select city"),
            postal_code: OptionWidget::new("Select postal code"),
        }
    }

    pub fn controller(&self) -> &Arc<CascadeController> {
        &self.controller
    }

    /// Mounts with previously stored values (or `SelectionState::default()`).
    ///
    /// The stored values are rendered immediately; lists load in the
    /// background.
    pub fn mount(&mut self, initial: SelectionState) {
        let issued = self.controller.begin_mount(initial);
        let controller = self.controller.clone();
        self.track(tokio::spawn(async move {
            controller.finish_mount(issued).await;
        }));
        self.sync();
    }

    /// Disables every dropdown, e.g. while the surrounding form submits.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        self.sync();
    }

    pub fn widget(&self, level: Level) -> &OptionWidget {
        match level {
            Level::Region => &self.region,
            Level::SubRegion => &self.sub_region,
            Level::Locality => &self.locality,
            Level::PostalCode => &self.postal_code,
        }
    }

    /// Mutable access for open/close, filter text and keyboard navigation.
    pub fn widget_mut(&mut self, level: Level) -> &mut OptionWidget {
        match level {
            Level::Region => &mut self.region,
            Level::SubRegion => &mut self.sub_region,
            Level::Locality => &mut self.locality,
            Level::PostalCode => &mut self.postal_code,
        }
    }

    /// Picks `value` at `level`. Returns `false` if the widget rejected it.
    pub fn choose(&mut self, level: Level, value: &str) -> bool {
        match self.widget_mut(level).select(value) {
            Some(value) => {
                self.apply(level, &value);
                true
            }
            None => false,
        }
    }

    /// Picks the highlighted option of an open widget (the Enter key).
    pub fn confirm(&mut self, level: Level) -> bool {
        match self.widget_mut(level).confirm() {
            Some(value) => {
                self.apply(level, &value);
                true
            }
            None => false,
        }
    }

    /// Refreshes all widgets from the controller's latest snapshot.
    pub fn sync(&mut self) {
        let view = self.views.borrow_and_update().clone();
        self.render(&view);
    }

    /// Waits for the next snapshot and renders it.
    ///
    /// Returns `false` once no further snapshots can arrive.
    pub async fn changed(&mut self) -> bool {
        if self.views.changed().await.is_err() {
            return false;
        }
        self.sync();
        true
    }

    /// Waits until every load started by this selector has finished, then
    /// renders the final snapshot.
    pub async fn settled(&mut self) {
        for handle in std::mem::take(&mut self.pending) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "location load task failed");
            }
        }
        self.sync();
    }

    fn apply(&mut self, level: Level, value: &str) {
        let controller = self.controller.clone();
        match level {
            Level::Region => {
                if let Some((region_id, issued)) = controller.begin_region(value) {
                    self.track(tokio::spawn(async move {
                        controller.resolve_region(&region_id, issued).await;
                    }));
                }
            }
            Level::SubRegion => controller.select_sub_region(value),
            Level::Locality => {
                if let Some((region_id, locality, issued)) = controller.begin_locality(value) {
                    self.track(tokio::spawn(async move {
                        controller
                            .refresh_postal_codes(&region_id, &locality, issued)
                            .await;
                    }));
                }
            }
            Level::PostalCode => controller.select_postal_code(value),
        }
        self.sync();
    }

    fn track(&mut self, handle: JoinHandle<()>) {
        self.pending.retain(|h| !h.is_finished());
        self.pending.push(handle);
    }

    fn render(&mut self, view: &CascadeView) {
        let selection = &view.selection;
        let no_region = selection.region_id.is_none();

        self.region.set_options(
            view.regions
                .iter()
                .map(|r| SelectOption::new(&r.id, &r.name))
                .collect(),
        );
        self.region.set_value(selection.region_id.clone());
        self.region.set_loading(view.loading.regions);
        self.region.set_disabled(self.disabled);

        self.sub_region.set_options(plain_options(&view.sub_regions));
        self.sub_region.set_value(view.sub_region.clone());
        self.sub_region.set_loading(view.loading.sub_regions);
        self.sub_region.set_disabled(self.disabled || no_region);

        self.locality.set_options(plain_options(&view.localities));
        self.locality.set_value(selection.locality.clone());
        self.locality.set_loading(view.loading.localities);
        self.locality.set_disabled(self.disabled || no_region);

        self.postal_code.set_options(plain_options(&view.postal_codes));
        self.postal_code.set_value(selection.postal_code.clone());
        self.postal_code.set_loading(view.loading.postal_codes);
        self.postal_code
            .set_disabled(self.disabled || selection.locality.is_none());
    }
}

impl Drop for LocationSelector {
    fn drop(&mut self) {
        for handle in &self.pending {
            handle.abort();
        }
    }
}

fn plain_options(values: &[String]) -> Vec<SelectOption> {
    values.iter().map(SelectOption::plain).collect()
}

/// Default label of the quick-search box.
pub const QUICK_SEARCH_LABEL: &str = "Quick location search";

/// Default placeholder of the quick-search box.
pub const QUICK_SEARCH_PLACEHOLDER: &str = "Type a city, state or postal code";

/// Search box emitting complete `(region, locality, postal code)` triples.
#[derive(Debug)]
pub struct LocationQuickSearch {
    controller: QuickSearchController,
    label: String,
    placeholder: String,
}

impl LocationQuickSearch {
    /// `on_location_select(region, locality, postal_code)` is invoked at most
    /// once per selection.
    pub fn new(
        catalog: DynCatalog,
        config: SearchConfig,
        on_location_select: impl Fn(&str, &str, &str) + Send + Sync + 'static,
    ) -> Self {
        let controller = QuickSearchController::new(catalog, config).with_on_select(
            move |record: &LocationRecord| {
                on_location_select(&record.region, &record.locality, &record.postal_code)
            },
        );
        Self {
            controller,
            label: QUICK_SEARCH_LABEL.to_string(),
            placeholder: QUICK_SEARCH_PLACEHOLDER.to_string(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn controller(&self) -> &QuickSearchController {
        &self.controller
    }

    pub fn input(&self, text: &str) {
        self.controller.input(text);
    }

    /// Selects the result at `index`. Returns `false` if there is none.
    pub fn select(&self, index: usize) -> bool {
        self.controller.select(index).is_some()
    }

    pub fn view(&self) -> QuickSearchView {
        self.controller.view()
    }
}
