//! `tether reorder`: Rewrite the order of an ordered relationship.

use crate::cmd::replace::{LinksReport, render_links};
use crate::cmd::{Selector, open_workspace};
use crate::output::OutputMode;
use anyhow::Result;
use clap::Args;
use std::path::Path;
use tether_core::{Direction, EntityId};

#[derive(Args, Debug)]
pub struct ReorderArgs {
    #[command(flatten)]
    pub selector: Selector,

    /// Source entity ID.
    pub from: EntityId,

    /// The currently linked target IDs in their new order.
    #[arg(required = true)]
    pub to: Vec<EntityId>,
}

/// Execute `tether reorder`.
///
/// # Errors
///
/// Returns an error if the relationship is not ordered or the IDs differ
/// from the current links.
pub fn run_reorder(args: &ReorderArgs, output: OutputMode, config_path: &Path) -> Result<()> {
    let workspace = open_workspace(config_path)?;
    let store = args.selector.select(&workspace.registry)?;
    store.reorder(&workspace.conn, args.from, &args.to)?;

    let report = LinksReport {
        relationship: store.definition().name(),
        from_id: args.from,
        to_ids: store.get_related_ids(&workspace.conn, args.from, Direction::From)?,
    };
    render_links(output, "Reordered", &report)
}
