use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::RelationshipDefinition;

/// Config file name looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tether.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TetherConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub tables: TablesConfig,
    #[serde(default)]
    pub relationships: Vec<RelationshipConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesConfig {
    #[serde(default = "default_table_prefix")]
    pub prefix: String,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            prefix: default_table_prefix(),
        }
    }
}

/// One `[[relationships]]` entry, kept textual until registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipConfig {
    pub name: String,
    pub from: String,
    pub to: String,
    pub cardinality: String,
    #[serde(default)]
    pub ordered: bool,
    #[serde(default)]
    pub unique: bool,
}

impl RelationshipConfig {
    /// Parse this entry into a definition.
    ///
    /// # Errors
    ///
    /// Returns an error naming the entry if a type or the cardinality does
    /// not parse, or the name is blank.
    pub fn to_definition(&self) -> Result<RelationshipDefinition> {
        let definition = RelationshipDefinition::parse(
            &self.name,
            &self.from,
            &self.to,
            &self.cardinality,
            self.ordered,
        )
        .with_context(|| format!("Invalid relationship '{}'", self.name))?;
        Ok(definition.with_unique(self.unique))
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("tether.db")
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_table_prefix() -> String {
    crate::db::tables::DEFAULT_TABLE_PREFIX.to_string()
}

/// Load a config file. A missing file yields the defaults with no
/// relationships.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<TetherConfig> {
    if !path.exists() {
        return Ok(TetherConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<TetherConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Database path with relative paths anchored at the config file's
/// directory.
#[must_use]
pub fn resolve_db_path(config_path: &Path, config: &TetherConfig) -> PathBuf {
    let db_path = &config.database.path;
    if db_path.is_absolute() {
        return db_path.clone();
    }
    config_path
        .parent()
        .map_or_else(|| db_path.clone(), |dir| dir.join(db_path))
}
