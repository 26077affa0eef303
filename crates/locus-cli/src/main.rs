mod cli;
mod commands;
mod config;
mod observability;
mod output;

use anyhow::Result;
use clap::Parser;
use locus_cascade::SelectionState;
use locus_catalog::DynCatalog;

use cli::{Cli, Commands, ConfigCommands, OutputFormat};
use config::ConfigFile;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing(cli.log_level.as_deref());
    let format = cli.format.unwrap_or_default();
    let file = config::load()?;

    match &cli.command {
        Commands::Regions => {
            let catalog = open(&cli, &file)?;
            commands::catalog::regions(catalog.as_ref(), format).await?;
        }
        Commands::SubRegions(args) => {
            let catalog = open(&cli, &file)?;
            commands::catalog::sub_regions(catalog.as_ref(), &args.region, format).await?;
        }
        Commands::Localities(args) => {
            let catalog = open(&cli, &file)?;
            commands::catalog::localities(catalog.as_ref(), &args.region, format).await?;
        }
        Commands::PostalCodes(args) => {
            let catalog = open(&cli, &file)?;
            commands::catalog::postal_codes(
                catalog.as_ref(),
                &args.region,
                &args.locality,
                format,
            )
            .await?;
        }
        Commands::Search(args) => {
            let catalog = open(&cli, &file)?;
            commands::search::search(catalog, file.search.clone(), &args.text, format).await?;
        }
        Commands::Resolve(args) => {
            let catalog = open(&cli, &file)?;
            let requested = SelectionState::new(&args.region, &args.locality, &args.postal_code);
            commands::resolve::resolve(catalog, requested, format).await?;
        }
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => show_config(&cli, &file, format)?,
        },
    }

    Ok(())
}

fn open(cli: &Cli, file: &ConfigFile) -> Result<DynCatalog> {
    let source = config::resolve_source(cli.server.as_deref(), cli.data.as_deref(), file)?;
    tracing::debug!(source = %source.describe(), "opening catalog");
    config::open_catalog(&source)
}

fn show_config(cli: &Cli, file: &ConfigFile, format: OutputFormat) -> Result<()> {
    let path = config::config_path()?;
    let source = config::resolve_source(cli.server.as_deref(), cli.data.as_deref(), file)
        .map(|s| s.describe())
        .unwrap_or_else(|_| "(not set)".to_string());

    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "configFile": path.display().to_string(),
            "catalog": source,
            "timeoutSecs": file.catalog.timeout_secs,
            "search": file.search,
        })),
        OutputFormat::Table => {
            output::print_field("Config file", &path.display().to_string());
            output::print_field("Catalog", &source);
            output::print_field(
                "Timeout",
                &file
                    .catalog
                    .timeout_secs
                    .map_or_else(|| "default".to_string(), |s| format!("{s}s")),
            );
            output::print_field("Debounce", &format!("{}ms", file.search.debounce_ms));
            output::print_field(
                "Min query chars",
                &file.search.min_query_chars.to_string(),
            );
            output::print_field("Max results", &file.search.max_results.to_string());
            Ok(())
        }
    }
}
