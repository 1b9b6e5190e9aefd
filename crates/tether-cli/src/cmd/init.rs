//! `tether init`: Open the database and ensure every join table.

use crate::cmd::open_workspace;
use crate::output::{OutputMode, render};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {}

#[derive(Debug, Serialize)]
struct InitReport {
    database: String,
    prefix: String,
    relationships: usize,
    tables: Vec<String>,
}

/// Execute `tether init`.
///
/// Safe to run repeatedly: table creation is idempotent.
///
/// # Errors
///
/// Returns an error if the config is invalid or a table cannot be created.
pub fn run_init(_args: &InitArgs, output: OutputMode, config_path: &Path) -> Result<()> {
    let workspace = open_workspace(config_path)?;
    let tables = workspace
        .registry
        .tables()
        .ensured_tables(&workspace.conn)?
        .into_iter()
        .map(|entry| entry.table_name)
        .collect();

    let report = InitReport {
        database: workspace.db_path.display().to_string(),
        prefix: workspace.config.tables.prefix.clone(),
        relationships: workspace.registry.len(),
        tables,
    };

    render(output, &report, |report, w| {
        writeln!(w, "Initialized {}", report.database)?;
        writeln!(
            w,
            "{} relationship(s), {} join table(s)",
            report.relationships,
            report.tables.len()
        )?;
        for table in &report.tables {
            writeln!(w, "  {table}")?;
        }
        Ok(())
    })
}
