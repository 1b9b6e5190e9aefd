//! Subcommand handlers.
//!
//! Each module exposes `run_<name>(args, output, config_path)`. Handlers
//! return `anyhow::Result`; `main` renders any failure.

pub mod add;
pub mod by_name;
pub mod init;
pub mod purge;
pub mod related;
pub mod relationships;
pub mod reorder;
pub mod replace;
pub mod rm;
pub mod tables;

use anyhow::{Context as _, Result, bail};
use clap::Args;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tether_core::config::{TetherConfig, load_config, resolve_db_path};
use tether_core::{EntityType, Registry, RegistryBuilder, RelationError, RelationshipStore, db};
use tracing::debug;

/// Loaded configuration, open database, and frozen registry.
pub struct Workspace {
    pub config: TetherConfig,
    pub db_path: PathBuf,
    pub conn: Connection,
    pub registry: Registry,
}

/// Load `config_path`, open its database, and ensure every join table the
/// configured relationships need.
pub fn open_workspace(config_path: &Path) -> Result<Workspace> {
    let config = load_config(config_path)?;
    let db_path = resolve_db_path(config_path, &config);
    let conn = db::open(&db_path, config.database.busy_timeout())?;
    let registry = RegistryBuilder::from_config(&config)?
        .freeze(&conn)
        .context("Failed to prepare join tables")?;
    debug!(
        db = %db_path.display(),
        relationships = registry.len(),
        "workspace ready"
    );

    Ok(Workspace {
        config,
        db_path,
        conn,
        registry,
    })
}

/// Names one relationship store: by name, narrowed by type when the name
/// is registered for several type pairs.
#[derive(Args, Debug, Clone)]
pub struct Selector {
    /// Relationship name.
    pub name: String,

    /// Source entity type (e.g. `post:car`), when the name is shared.
    #[arg(long)]
    pub from_type: Option<EntityType>,

    /// Target entity type (e.g. `user:author`), when the name is shared.
    #[arg(long)]
    pub to_type: Option<EntityType>,
}

impl Selector {
    /// Resolve to exactly one store.
    pub fn select<'r>(&self, registry: &'r Registry) -> Result<&'r RelationshipStore> {
        let candidates: Vec<&RelationshipStore> = registry
            .get_by_name(&self.name)?
            .into_iter()
            .filter(|store| {
                let definition = store.definition();
                self.from_type
                    .as_ref()
                    .is_none_or(|from| definition.from_type() == from)
                    && self
                        .to_type
                        .as_ref()
                        .is_none_or(|to| definition.to_type() == to)
            })
            .collect();

        match candidates.as_slice() {
            [store] => Ok(*store),
            [] => Err(RelationError::NotFound(format!(
                "'{}' for the given --from-type/--to-type",
                self.name
            ))
            .into()),
            several => bail!(
                "'{}' is registered for {} type pairs; pass --from-type and/or --to-type",
                self.name,
                several.len()
            ),
        }
    }
}
