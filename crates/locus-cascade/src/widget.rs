//! Searchable single-select control.
//!
//! [`OptionWidget`] holds the selection-relevant state of one dropdown:
//! its current value, option list, loading and disabled flags, plus the
//! transient interaction state (open/closed, filter text, highlighted row).
//! Rendering is left to the embedding UI, which draws a [`WidgetView`].

use std::fmt;

/// Text shown when a widget has nothing to offer.
pub const NO_OPTIONS_TEXT: &str = "No options available";

/// One selectable entry. `value` is what gets reported, `label` is what is
/// displayed and filtered on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// An option whose label is its value.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            value: text.clone(),
            label: text,
        }
    }
}

/// Returns the options whose label contains `query`, case-insensitively,
/// in their original order.
///
/// An empty query returns every option. The list is never sorted or
/// deduplicated; ordering and uniqueness are the producer's responsibility.
pub fn filter_options<'a>(options: &'a [SelectOption], query: &str) -> Vec<&'a SelectOption> {
    if query.is_empty() {
        return options.iter().collect();
    }
    let needle = query.to_lowercase();
    options
        .iter()
        .filter(|o| o.label.to_lowercase().contains(&needle))
        .collect()
}

/// What the widget should display right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetView {
    /// Collapsed; shows the selected label or the placeholder.
    Closed {
        label: Option<String>,
        placeholder: String,
        disabled: bool,
    },
    /// Open while the option list is being fetched; no filter input, no list.
    Loading,
    /// Open with a filter input and the matching options.
    Open {
        query: String,
        items: Vec<SelectOption>,
        highlighted: Option<usize>,
    },
    /// Open, but nothing matches (or there are no options at all).
    Empty { query: String },
}

type SelectCallback = Box<dyn FnMut(&str) + Send>;

/// State of one searchable single-select control.
pub struct OptionWidget {
    placeholder: String,
    value: Option<String>,
    options: Vec<SelectOption>,
    loading: bool,
    disabled: bool,
    open: bool,
    query: String,
    highlighted: Option<usize>,
    on_select: Option<SelectCallback>,
}

impl OptionWidget {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            value: None,
            options: Vec::new(),
            loading: false,
            disabled: false,
            open: false,
            query: String::new(),
            highlighted: None,
            on_select: None,
        }
    }

    /// Registers the callback invoked once for every user selection.
    #[must_use]
    pub fn with_on_select(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_select = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.set_options(options);
        self
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Label of the current value. Falls back to the raw value while the
    /// option list does not contain it yet, so hydrated values stay visible.
    pub fn selected_label(&self) -> Option<&str> {
        let value = self.value.as_deref()?;
        Some(
            self.options
                .iter()
                .find(|o| o.value == value)
                .map_or(value, |o| o.label.as_str()),
        )
    }

    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    pub fn set_options(&mut self, options: Vec<SelectOption>) {
        self.options = options;
        self.reset_highlight();
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Disabling also closes the widget.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.close();
        }
    }

    /// Opens the widget. Returns `false` if it is disabled.
    pub fn open(&mut self) -> bool {
        if self.disabled {
            return false;
        }
        self.open = true;
        self.query.clear();
        self.highlighted = self
            .value
            .as_deref()
            .and_then(|v| self.options.iter().position(|o| o.value == v))
            .or_else(|| (!self.options.is_empty()).then_some(0));
        true
    }

    /// Closes the widget and discards the filter text.
    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
        self.highlighted = None;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.reset_highlight();
    }

    /// Options matching the current filter text.
    pub fn filtered(&self) -> Vec<&SelectOption> {
        filter_options(&self.options, &self.query)
    }

    pub fn highlight_next(&mut self) {
        let len = self.filtered().len();
        if len == 0 {
            self.highlighted = None;
            return;
        }
        self.highlighted = Some(match self.highlighted {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        });
    }

    pub fn highlight_previous(&mut self) {
        let len = self.filtered().len();
        if len == 0 {
            self.highlighted = None;
            return;
        }
        self.highlighted = Some(match self.highlighted {
            Some(i) if i > 0 && i <= len => i - 1,
            _ => len - 1,
        });
    }

    /// Selects the highlighted option (the Enter key).
    pub fn confirm(&mut self) -> Option<String> {
        if !self.open {
            return None;
        }
        let value = self
            .highlighted
            .and_then(|i| self.filtered().get(i).map(|o| o.value.clone()))?;
        self.select(&value)
    }

    /// Selects `value` on behalf of the user.
    ///
    /// Ignored (returns `None`) while disabled or loading, or when `value` is
    /// not one of the options. Otherwise stores the value, invokes the select
    /// callback exactly once, clears the filter text and closes.
    pub fn select(&mut self, value: &str) -> Option<String> {
        if self.disabled || self.loading {
            return None;
        }
        if !self.options.iter().any(|o| o.value == value) {
            tracing::debug!(value, "ignoring selection outside option list");
            return None;
        }
        self.value = Some(value.to_string());
        self.close();
        if let Some(on_select) = self.on_select.as_mut() {
            on_select(value);
        }
        Some(value.to_string())
    }

    pub fn view(&self) -> WidgetView {
        if !self.open {
            return WidgetView::Closed {
                label: self.selected_label().map(str::to_string),
                placeholder: self.placeholder.clone(),
                disabled: self.disabled,
            };
        }
        if self.loading {
            return WidgetView::Loading;
        }
        let items: Vec<SelectOption> = self.filtered().into_iter().cloned().collect();
        if items.is_empty() {
            return WidgetView::Empty {
                query: self.query.clone(),
            };
        }
        WidgetView::Open {
            query: self.query.clone(),
            items,
            highlighted: self.highlighted,
        }
    }

    fn reset_highlight(&mut self) {
        self.highlighted = (self.open && !self.filtered().is_empty()).then_some(0);
    }
}

impl fmt::Debug for OptionWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionWidget")
            .field("placeholder", &self.placeholder)
            .field("value", &self.value)
            .field("options", &self.options.len())
            .field("loading", &self.loading)
            .field("disabled", &self.disabled)
            .field("open", &self.open)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}
