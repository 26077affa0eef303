use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "locus")]
#[command(about = "Locus CLI: browse regions, localities and postal codes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Catalog base URL (overrides config and LOCUS_URL env var)
    #[arg(short, long, global = true, env = "LOCUS_URL")]
    pub server: Option<String>,

    /// Offline JSON dataset, used when no catalog URL is configured
    #[arg(short, long, global = true)]
    pub data: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log filter, e.g. `debug` or `locus_cascade=trace` (RUST_LOG wins if set)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all regions
    Regions,
    /// List sub-regions of a region
    SubRegions(RegionArgs),
    /// List localities of a region
    Localities(RegionArgs),
    /// List postal codes of a locality
    PostalCodes(PostalCodesArgs),
    /// Free-text search for complete locations
    Search(SearchArgs),
    /// Validate a stored selection against the catalog
    Resolve(ResolveArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct RegionArgs {
    /// Region id (e.g. mh)
    pub region: String,
}

#[derive(clap::Args)]
pub struct PostalCodesArgs {
    /// Region id (e.g. mh)
    pub region: String,
    /// Locality name (e.g. Pune)
    pub locality: String,
}

#[derive(clap::Args)]
pub struct SearchArgs {
    /// Search text: city, state or postal code fragment
    pub text: String,
}

#[derive(clap::Args)]
pub struct ResolveArgs {
    /// Stored region id
    #[arg(long, default_value = "")]
    pub region: String,
    /// Stored locality
    #[arg(long, default_value = "")]
    pub locality: String,
    /// Stored postal code
    #[arg(long, default_value = "")]
    pub postal_code: String,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
}
