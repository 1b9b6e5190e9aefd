//! `tether related`: IDs linked to an entity through one relationship.

use crate::cmd::{Selector, open_workspace};
use crate::output::{OutputMode, id_list, render};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;
use tether_core::{Direction, EntityId};

#[derive(Args, Debug)]
pub struct RelatedArgs {
    #[command(flatten)]
    pub selector: Selector,

    /// Entity ID to look up.
    pub id: EntityId,

    /// `from` follows links out of `id`; `to` finds entities linking to it.
    #[arg(long, default_value = "from")]
    pub direction: Direction,
}

#[derive(Debug, Serialize)]
struct RelatedReport<'a> {
    relationship: &'a str,
    id: EntityId,
    direction: Direction,
    related: Vec<EntityId>,
}

/// Execute `tether related`.
///
/// # Errors
///
/// Returns an error if the relationship is unknown or the lookup fails.
pub fn run_related(args: &RelatedArgs, output: OutputMode, config_path: &Path) -> Result<()> {
    let workspace = open_workspace(config_path)?;
    let store = args.selector.select(&workspace.registry)?;

    let report = RelatedReport {
        relationship: store.definition().name(),
        id: args.id,
        direction: args.direction,
        related: store.get_related_ids(&workspace.conn, args.id, args.direction)?,
    };
    render(output, &report, |report, w| writeln!(w, "{}", id_list(&report.related)))
}
