use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use locus_cascade::SearchConfig;
use locus_catalog::{CatalogConfig, CatalogDataset, DynCatalog, HttpCatalogClient, InMemoryCatalog};
use serde::{Deserialize, Serialize};

/// `[catalog]` table of `~/.locus/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSection {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Where catalog data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Remote(CatalogConfig),
    Offline(PathBuf),
}

impl CatalogSource {
    pub fn describe(&self) -> String {
        match self {
            Self::Remote(config) => config.base_url.clone(),
            Self::Offline(path) => format!("{} (offline)", path.display()),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".locus")
        .join("config.toml"))
}

pub fn load() -> Result<ConfigFile> {
    load_from(&config_path()?)
}

pub fn load_from(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg: ConfigFile =
        toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(cfg)
}

pub fn resolve_source(
    cli_server: Option<&str>,
    cli_data: Option<&Path>,
    file: &ConfigFile,
) -> Result<CatalogSource> {
    let timeout_secs = file
        .catalog
        .timeout_secs
        .unwrap_or_else(|| CatalogConfig::default().timeout_secs);

    // 1. --server flag / LOCUS_URL env
    if let Some(url) = cli_server {
        return Ok(CatalogSource::Remote(CatalogConfig {
            base_url: url.to_string(),
            timeout_secs,
        }));
    }
    // 2. config.toml
    if let Some(url) = &file.catalog.base_url {
        return Ok(CatalogSource::Remote(CatalogConfig {
            base_url: url.clone(),
            timeout_secs,
        }));
    }
    // 3. offline dataset
    if let Some(path) = cli_data {
        return Ok(CatalogSource::Offline(path.to_path_buf()));
    }
    anyhow::bail!(
        "No catalog configured. Use --server, set LOCUS_URL env var, add [catalog] base_url to ~/.locus/config.toml, or pass --data <file.json>"
    )
}

pub fn open_catalog(source: &CatalogSource) -> Result<DynCatalog> {
    match source {
        CatalogSource::Remote(config) => {
            let client = HttpCatalogClient::new(config)
                .with_context(|| format!("Cannot use catalog at {}", config.base_url))?;
            Ok(Arc::new(client))
        }
        CatalogSource::Offline(path) => {
            let dataset = CatalogDataset::from_path(path)?;
            tracing::debug!(path = %path.display(), regions = dataset.regions.len(), "loaded offline dataset");
            Ok(Arc::new(InMemoryCatalog::new(dataset)))
        }
    }
}
