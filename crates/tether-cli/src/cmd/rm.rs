//! `tether rm`: Unlink two entities.

use crate::cmd::{Selector, open_workspace};
use crate::output::{OutputMode, render};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;
use tether_core::EntityId;

#[derive(Args, Debug)]
pub struct RmArgs {
    #[command(flatten)]
    pub selector: Selector,

    /// Source entity ID.
    pub from: EntityId,

    /// Target entity ID.
    pub to: EntityId,
}

#[derive(Debug, Serialize)]
struct RmReport<'a> {
    relationship: &'a str,
    from_id: EntityId,
    to_id: EntityId,
    removed: usize,
}

/// Execute `tether rm`. Removing a link that does not exist succeeds with
/// `removed: 0`.
///
/// # Errors
///
/// Returns an error if the relationship is unknown or the delete fails.
pub fn run_rm(args: &RmArgs, output: OutputMode, config_path: &Path) -> Result<()> {
    let workspace = open_workspace(config_path)?;
    let store = args.selector.select(&workspace.registry)?;
    let removed = store.remove(&workspace.conn, args.from, args.to)?;

    let report = RmReport {
        relationship: store.definition().name(),
        from_id: args.from,
        to_id: args.to,
        removed,
    };
    render(output, &report, |report, w| {
        if report.removed == 0 {
            writeln!(w, "No link {} -> {} to remove", report.from_id, report.to_id)
        } else {
            writeln!(
                w,
                "Removed {} link(s) {} -> {}",
                report.removed, report.from_id, report.to_id
            )
        }
    })
}
