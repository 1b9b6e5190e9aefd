//! `tether relationships`: List configured relationship definitions.

use crate::output::{OutputMode, render};
use anyhow::Result;
use clap::Args;
use std::path::Path;
use tether_core::RegistryBuilder;
use tether_core::config::load_config;

#[derive(Args, Debug)]
pub struct RelationshipsArgs {}

/// Execute `tether relationships`. Reads the config only; the database is
/// not opened.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or an entry is invalid.
pub fn run_relationships(
    _args: &RelationshipsArgs,
    output: OutputMode,
    config_path: &Path,
) -> Result<()> {
    let config = load_config(config_path)?;
    let builder = RegistryBuilder::from_config(&config)?;

    render(output, &builder.definitions(), |definitions, w| {
        if definitions.is_empty() {
            return writeln!(w, "No relationships configured.");
        }
        for definition in *definitions {
            let mut flags = Vec::new();
            if definition.is_ordered() {
                flags.push("ordered");
            }
            if definition.is_unique() {
                flags.push("unique");
            }
            writeln!(
                w,
                "{:<20} {} -> {}  {}{}",
                definition.name(),
                definition.from_type(),
                definition.to_type(),
                definition.cardinality(),
                if flags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", flags.join(", "))
                }
            )?;
        }
        Ok(())
    })
}
