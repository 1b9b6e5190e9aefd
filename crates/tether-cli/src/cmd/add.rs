//! `tether add`: Link two entities.

use crate::cmd::{Selector, open_workspace};
use crate::output::{OutputMode, render};
use anyhow::Result;
use clap::Args;
use std::path::Path;
use tether_core::EntityId;
use tracing::info;

#[derive(Args, Debug)]
pub struct AddArgs {
    #[command(flatten)]
    pub selector: Selector,

    /// Source entity ID.
    pub from: EntityId,

    /// Target entity ID.
    pub to: EntityId,
}

/// Execute `tether add`.
///
/// # Errors
///
/// Returns an error if the relationship is unknown or the link would break
/// its cardinality.
pub fn run_add(args: &AddArgs, output: OutputMode, config_path: &Path) -> Result<()> {
    let workspace = open_workspace(config_path)?;
    let store = args.selector.select(&workspace.registry)?;
    let row = store.add(&workspace.conn, args.from, args.to)?;
    info!(relationship = %store.definition(), row_id = row.id, "linked");

    render(output, &row, |row, w| {
        write!(w, "Linked {} -> {} via '{}'", row.from_id, row.to_id, row.relationship_name)?;
        if let Some(order) = row.order {
            write!(w, " at position {order}")?;
        }
        writeln!(w)
    })
}
