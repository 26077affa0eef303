use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use colored::Colorize;
use locus_cascade::{CascadeController, CascadeView, SelectionObserver, SelectionState};
use locus_catalog::DynCatalog;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::output::{print_field, print_json};

/// Levels the cascade cleared while validating the stored selection.
#[derive(Default)]
struct ClearedLevels(Mutex<Vec<&'static str>>);

impl ClearedLevels {
    fn record(&self, level: &'static str, value: Option<&str>) {
        if value.is_none() {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(level);
        }
    }

    fn take(&self) -> Vec<&'static str> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl SelectionObserver for ClearedLevels {
    fn region_changed(&self, region_id: Option<&str>) {
        self.record("region", region_id);
    }

    fn sub_region_changed(&self, sub_region: Option<&str>) {
        self.record("sub_region", sub_region);
    }

    fn locality_changed(&self, locality: Option<&str>) {
        self.record("locality", locality);
    }

    fn postal_code_changed(&self, postal_code: Option<&str>) {
        self.record("postal_code", postal_code);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Resolution {
    requested: SelectionState,
    selection: SelectionState,
    cleared: Vec<&'static str>,
    sub_regions: Vec<String>,
    localities: Vec<String>,
    postal_codes: Vec<String>,
}

impl Resolution {
    fn new(requested: SelectionState, view: CascadeView, cleared: Vec<&'static str>) -> Self {
        Self {
            requested,
            selection: view.selection,
            cleared,
            sub_regions: view.sub_regions.to_vec(),
            localities: view.localities.to_vec(),
            postal_codes: view.postal_codes.to_vec(),
        }
    }
}

/// Hydrates a cascade with a stored selection and prints what it converges to.
pub async fn resolve(
    catalog: DynCatalog,
    requested: SelectionState,
    format: OutputFormat,
) -> Result<()> {
    let resolution = converge(catalog, requested).await;
    match format {
        OutputFormat::Json => print_json(&resolution)?,
        OutputFormat::Table => print_resolution(&resolution),
    }
    Ok(())
}

async fn converge(catalog: DynCatalog, requested: SelectionState) -> Resolution {
    let cleared = Arc::new(ClearedLevels::default());
    let controller = CascadeController::with_observer(catalog, cleared.clone());
    controller.mount(requested.clone()).await;
    Resolution::new(requested, controller.view(), cleared.take())
}

fn print_resolution(resolution: &Resolution) {
    let selection = &resolution.selection;
    print_field("Region", or_unset(&selection.region_id));
    print_field("Locality", or_unset(&selection.locality));
    print_field("Postal code", or_unset(&selection.postal_code));
    if !resolution.cleared.is_empty() {
        println!(
            "{} {}",
            "Cleared:".yellow(),
            resolution.cleared.join(", ").yellow()
        );
    }
    print_field("Sub-regions", &resolution.sub_regions.join(", "));
    print_field("Localities", &resolution.localities.join(", "));
    print_field("Postal codes", &resolution.postal_codes.join(", "));
}

fn or_unset(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(not set)")
}
