use anyhow::Result;
use colored::Colorize;
use locus_cascade::NO_OPTIONS_TEXT;
use locus_catalog::{LocationRecord, Region};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_field(key: &str, value: &str) {
    println!("{}: {}", key.cyan(), value);
}

pub fn print_regions(regions: &[Region], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(regions),
        OutputFormat::Table => {
            println!("{}", regions_table(regions));
            Ok(())
        }
    }
}

pub fn print_names(header: &str, names: &[String], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(names),
        OutputFormat::Table => {
            println!("{}", names_table(header, names));
            Ok(())
        }
    }
}

pub fn print_records(records: &[LocationRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(records),
        OutputFormat::Table => {
            println!("{}", records_table(records));
            Ok(())
        }
    }
}

fn regions_table(regions: &[Region]) -> String {
    if regions.is_empty() {
        return NO_OPTIONS_TEXT.to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(["ID", "Name"]);
    for region in regions {
        builder.push_record([region.id.as_str(), region.name.as_str()]);
    }
    builder.build().with(Style::rounded()).to_string()
}

fn names_table(header: &str, names: &[String]) -> String {
    if names.is_empty() {
        return NO_OPTIONS_TEXT.to_string();
    }
    let mut builder = Builder::default();
    builder.push_record([header]);
    for name in names {
        builder.push_record([name.as_str()]);
    }
    builder.build().with(Style::rounded()).to_string()
}

fn records_table(records: &[LocationRecord]) -> String {
    if records.is_empty() {
        return NO_OPTIONS_TEXT.to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(["#", "Region", "Locality", "Postal code"]);
    for (i, record) in records.iter().enumerate() {
        builder.push_record([
            (i + 1).to_string(),
            record.region.clone(),
            record.locality.clone(),
            record.postal_code.clone(),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}
