//! `tether by-name`: Related IDs across every relationship sharing a name.

use crate::cmd::open_workspace;
use crate::output::{OutputMode, id_list, render};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;
use tether_core::{EntityId, EntityType, get_related_ids_by_name};

#[derive(Args, Debug)]
pub struct ByNameArgs {
    /// Relationship name.
    pub name: String,

    /// Entity ID to look up.
    pub id: EntityId,

    /// Entity type of `id`; only sides of that type are followed.
    /// Repeat when the ID names several entities.
    #[arg(long = "as", value_name = "ENTITY_TYPE", required = true)]
    pub entity_types: Vec<EntityType>,
}

#[derive(Debug, Serialize)]
struct ByNameReport<'a> {
    relationship: &'a str,
    id: EntityId,
    entity_types: &'a [EntityType],
    related: Vec<EntityId>,
}

/// Execute `tether by-name`.
///
/// # Errors
///
/// Returns an error if no relationship uses the name or a lookup fails.
pub fn run_by_name(args: &ByNameArgs, output: OutputMode, config_path: &Path) -> Result<()> {
    let workspace = open_workspace(config_path)?;
    let related = get_related_ids_by_name(
        &workspace.registry,
        &workspace.conn,
        args.entity_types.as_slice(),
        args.id,
        &args.name,
    )?;

    let report = ByNameReport {
        relationship: &args.name,
        id: args.id,
        entity_types: &args.entity_types,
        related,
    };
    render(output, &report, |report, w| writeln!(w, "{}", id_list(&report.related)))
}
