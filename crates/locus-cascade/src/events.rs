//! Selection change notifications.
//!
//! The cascade reports every change of a selected value through a
//! [`SelectionObserver`]. Observers are invoked after the controller's
//! internal lock has been released, in the order the changes were applied.

use std::fmt;

/// A single change of a selected value. `None` means the level was cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Region(Option<String>),
    SubRegion(Option<String>),
    Locality(Option<String>),
    PostalCode(Option<String>),
}

/// Receives selection changes from a [`CascadeController`](crate::CascadeController).
///
/// All methods default to no-ops so implementors only override what they need.
pub trait SelectionObserver: Send + Sync {
    fn region_changed(&self, _region_id: Option<&str>) {}

    /// Sub-regions are informational and never filter localities.
    fn sub_region_changed(&self, _sub_region: Option<&str>) {}

    fn locality_changed(&self, _locality: Option<&str>) {}

    fn postal_code_changed(&self, _postal_code: Option<&str>) {}
}

/// Observer that ignores every change.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SelectionObserver for NoopObserver {}

pub(crate) fn dispatch(observer: &dyn SelectionObserver, changes: Vec<SelectionChange>) {
    for change in changes {
        match change {
            SelectionChange::Region(v) => observer.region_changed(v.as_deref()),
            SelectionChange::SubRegion(v) => observer.sub_region_changed(v.as_deref()),
            SelectionChange::Locality(v) => observer.locality_changed(v.as_deref()),
            SelectionChange::PostalCode(v) => observer.postal_code_changed(v.as_deref()),
        }
    }
}

type Callback = Box<dyn Fn(Option<&str>) + Send + Sync>;

/// Closure-based observer: the `onRegionChange` / `onLocalityChange` /
/// `onPostalCodeChange` callbacks handed to a location selector.
///
/// # Example
///
/// ```
/// use locus_cascade::SelectionCallbacks;
///
/// let callbacks = SelectionCallbacks::new()
///     .on_region_change(|id| println!("region -> {id:?}"))
///     .on_locality_change(|name| println!("locality -> {name:?}"));
/// ```
#[derive(Default)]
pub struct SelectionCallbacks {
    on_region_change: Option<Callback>,
    on_sub_region_change: Option<Callback>,
    on_locality_change: Option<Callback>,
    on_postal_code_change: Option<Callback>,
}

impl SelectionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_region_change(mut self, f: impl Fn(Option<&str>) + Send + Sync + 'static) -> Self {
        self.on_region_change = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_sub_region_change(
        mut self,
        f: impl Fn(Option<&str>) + Send + Sync + 'static,
    ) -> Self {
        self.on_sub_region_change = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_locality_change(mut self, f: impl Fn(Option<&str>) + Send + Sync + 'static) -> Self {
        self.on_locality_change = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_postal_code_change(
        mut self,
        f: impl Fn(Option<&str>) + Send + Sync + 'static,
    ) -> Self {
        self.on_postal_code_change = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for SelectionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionCallbacks")
            .field("on_region_change", &self.on_region_change.is_some())
            .field("on_sub_region_change", &self.on_sub_region_change.is_some())
            .field("on_locality_change", &self.on_locality_change.is_some())
            .field("on_postal_code_change", &self.on_postal_code_change.is_some())
            .finish()
    }
}

impl SelectionObserver for SelectionCallbacks {
    fn region_changed(&self, region_id: Option<&str>) {
        if let Some(f) = &self.on_region_change {
            f(region_id);
        }
    }

    fn sub_region_changed(&self, sub_region: Option<&str>) {
        if let Some(f) = &self.on_sub_region_change {
            f(sub_region);
        }
    }

    fn locality_changed(&self, locality: Option<&str>) {
        if let Some(f) = &self.on_locality_change {
            f(locality);
        }
    }

    fn postal_code_changed(&self, postal_code: Option<&str>) {
        if let Some(f) = &self.on_postal_code_change {
            f(postal_code);
        }
    }
}
