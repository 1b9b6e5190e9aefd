//! `tether tables`: List the join-table catalog.

use crate::output::{OutputMode, render};
use anyhow::Result;
use clap::Args;
use std::path::Path;
use tether_core::config::{load_config, resolve_db_path};
use tether_core::db;
use tether_core::db::tables::TableManager;

#[derive(Args, Debug)]
pub struct TablesArgs {}

/// Execute `tether tables`. Lists what has been created so far without
/// creating anything.
///
/// # Errors
///
/// Returns an error if the config or the database cannot be opened.
pub fn run_tables(_args: &TablesArgs, output: OutputMode, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let conn = db::open(
        &resolve_db_path(config_path, &config),
        config.database.busy_timeout(),
    )?;
    let entries = TableManager::new(config.tables.prefix.clone())?.ensured_tables(&conn)?;

    render(output, &entries, |entries, w| {
        if entries.is_empty() {
            return writeln!(w, "No join tables yet. Run `tether init`.");
        }
        for entry in entries {
            writeln!(
                w,
                "{:<28} {:<16} v{}",
                entry.table_name, entry.category, entry.schema_version
            )?;
        }
        Ok(())
    })
}
