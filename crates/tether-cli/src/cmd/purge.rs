//! `tether purge`: Drop every link of a deleted entity.

use crate::cmd::open_workspace;
use crate::output::{OutputMode, render};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;
use tether_core::{EntityId, EntityType};
use tracing::info;

#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// Type of the deleted entity (e.g. `post:car`, `user:author`).
    pub entity_type: EntityType,

    /// ID of the deleted entity.
    pub id: EntityId,
}

#[derive(Debug, Serialize)]
struct PurgeReport<'a> {
    entity_type: &'a EntityType,
    id: EntityId,
    removed: usize,
}

/// Execute `tether purge`.
///
/// # Errors
///
/// Returns an error if the delete fails; nothing is removed in that case.
pub fn run_purge(args: &PurgeArgs, output: OutputMode, config_path: &Path) -> Result<()> {
    let workspace = open_workspace(config_path)?;
    let removed = workspace
        .registry
        .purge_entity(&workspace.conn, &args.entity_type, args.id)?;
    info!(entity_type = %args.entity_type, id = args.id, removed, "purged entity");

    let report = PurgeReport {
        entity_type: &args.entity_type,
        id: args.id,
        removed,
    };
    render(output, &report, |report, w| {
        writeln!(
            w,
            "Removed {} link(s) for {} {}",
            report.removed, report.entity_type, report.id
        )
    })
}
