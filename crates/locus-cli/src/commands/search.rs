use anyhow::{Context, Result};
use locus_cascade::{QuickSearchController, SearchConfig};
use locus_catalog::DynCatalog;

use crate::cli::OutputFormat;
use crate::output::print_records;

/// Types `text` into a quick-search box and prints what it settles on.
pub async fn search(
    catalog: DynCatalog,
    config: SearchConfig,
    text: &str,
    format: OutputFormat,
) -> Result<()> {
    let query = text.trim().to_string();
    if query.chars().count() < config.min_query_chars {
        anyhow::bail!(
            "Search text must be at least {} characters",
            config.min_query_chars
        );
    }

    let controller = QuickSearchController::new(catalog, config);
    let mut rx = controller.subscribe();
    controller.input(text);

    let view = rx
        .wait_for(|v| !v.loading && v.results_for.as_deref() == Some(query.as_str()))
        .await
        .context("Search was interrupted")?
        .clone();

    print_records(&view.results, format)
}
