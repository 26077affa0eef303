use anyhow::{Context, Result};
use locus_catalog::CatalogClient;

use crate::cli::OutputFormat;
use crate::output::{print_names, print_regions};

pub async fn regions(catalog: &dyn CatalogClient, format: OutputFormat) -> Result<()> {
    let regions = catalog.list_regions().await?;
    print_regions(&regions, format)
}

pub async fn sub_regions(
    catalog: &dyn CatalogClient,
    region_id: &str,
    format: OutputFormat,
) -> Result<()> {
    let names: Vec<String> = catalog
        .list_sub_regions(region_id)
        .await
        .with_context(|| format!("Cannot list sub-regions of {region_id}"))?
        .into_iter()
        .map(|s| s.name)
        .collect();
    print_names("Sub-region", &names, format)
}

pub async fn localities(
    catalog: &dyn CatalogClient,
    region_id: &str,
    format: OutputFormat,
) -> Result<()> {
    let names = catalog
        .list_localities(region_id)
        .await
        .with_context(|| format!("Cannot list localities of {region_id}"))?;
    print_names("Locality", &names, format)
}

pub async fn postal_codes(
    catalog: &dyn CatalogClient,
    region_id: &str,
    locality: &str,
    format: OutputFormat,
) -> Result<()> {
    let codes = catalog
        .list_postal_codes(region_id, locality)
        .await
        .with_context(|| format!("Cannot list postal codes of {locality} ({region_id})"))?;
    print_names("Postal code", &codes, format)
}
