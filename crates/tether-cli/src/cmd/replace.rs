//! `tether replace`: Make a list the complete set of links for a source.

use crate::cmd::{Selector, open_workspace};
use crate::output::{OutputMode, id_list, render};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;
use tether_core::{Direction, EntityId};

#[derive(Args, Debug)]
pub struct ReplaceArgs {
    #[command(flatten)]
    pub selector: Selector,

    /// Source entity ID.
    pub from: EntityId,

    /// New complete list of target IDs, in order. Empty clears the source.
    pub to: Vec<EntityId>,
}

#[derive(Debug, Serialize)]
pub struct LinksReport<'a> {
    pub relationship: &'a str,
    pub from_id: EntityId,
    pub to_ids: Vec<EntityId>,
}

pub fn render_links(output: OutputMode, verb: &str, report: &LinksReport<'_>) -> Result<()> {
    render(output, report, |report, w| {
        writeln!(
            w,
            "{verb} '{}' for {}: {}",
            report.relationship,
            report.from_id,
            id_list(&report.to_ids)
        )
    })
}

/// Execute `tether replace`. Either every link is written or none is.
///
/// # Errors
///
/// Returns an error if the relationship is unknown or any link would break
/// its cardinality; the previous links are kept in that case.
pub fn run_replace(args: &ReplaceArgs, output: OutputMode, config_path: &Path) -> Result<()> {
    let workspace = open_workspace(config_path)?;
    let store = args.selector.select(&workspace.registry)?;
    store.replace(&workspace.conn, args.from, &args.to)?;

    let report = LinksReport {
        relationship: store.definition().name(),
        from_id: args.from,
        to_ids: store.get_related_ids(&workspace.conn, args.from, Direction::From)?,
    };
    render_links(output, "Replaced", &report)
}
