//! Relationship registry.
//!
//! Registration and lookup are split into two types. A [`RegistryBuilder`]
//! accepts definitions; [`RegistryBuilder::freeze`] ensures every category
//! table exists and produces a read-only [`Registry`]. There is no way back
//! from a frozen registry to a builder, so nothing can be registered after
//! stores start serving reads and writes.
//!
//! A frozen registry holds no connection and is `Send + Sync`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::config::TetherConfig;
use crate::db::atomically;
use crate::db::repository::JoinRepository;
use crate::db::tables::TableManager;
use crate::error::{RelationError, Result};
use crate::model::{Category, Direction, EntityId, EntityType, RelationshipDefinition};
use crate::store::RelationshipStore;

// ---------------------------------------------------------------------------
// RegistryBuilder
// ---------------------------------------------------------------------------

/// Accepts relationship definitions until frozen.
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    tables: TableManager,
    definitions: Vec<RelationshipDefinition>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `tables` (and its prefix) for every store.
    #[must_use]
    pub fn with_tables(mut self, tables: TableManager) -> Self {
        self.tables = tables;
        self
    }

    /// Builder preloaded with the table prefix and every `[[relationships]]`
    /// entry of `config`, in file order.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is invalid, an entry does not parse, or
    /// two entries collide.
    pub fn from_config(config: &TetherConfig) -> anyhow::Result<Self> {
        let mut builder = Self::new().with_tables(TableManager::new(config.tables.prefix.clone())?);
        for entry in &config.relationships {
            builder.register(entry.to_definition()?)?;
        }
        Ok(builder)
    }

    /// Register `definition`.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError::Configuration`] if a definition with the
    /// same name and type pair is already registered. The earlier one stays.
    pub fn register(&mut self, definition: RelationshipDefinition) -> Result<()> {
        if self.definitions.iter().any(|existing| {
            existing.matches(
                definition.name(),
                definition.from_type(),
                definition.to_type(),
            )
        }) {
            return Err(RelationError::Configuration(format!(
                "relationship {definition} is already registered"
            )));
        }

        info!(
            relationship = %definition,
            cardinality = %definition.cardinality(),
            ordered = definition.is_ordered(),
            "registered relationship"
        );
        self.definitions.push(definition);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions in registration order.
    #[must_use]
    pub fn definitions(&self) -> &[RelationshipDefinition] {
        &self.definitions
    }

    /// Ensure every category table and build the read-only registry.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError::Schema`] if a join table cannot be created.
    pub fn freeze(self, conn: &Connection) -> Result<Registry> {
        let mut repos: HashMap<Category, Arc<dyn JoinRepository>> = HashMap::new();
        let mut stores = Vec::with_capacity(self.definitions.len());
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_types: HashMap<(EntityType, EntityType), Vec<usize>> = HashMap::new();

        for (index, definition) in self.definitions.into_iter().enumerate() {
            let repo = match repos.entry(definition.category()) {
                Entry::Occupied(entry) => Arc::clone(entry.get()),
                Entry::Vacant(entry) => {
                    let table = self.tables.ensure_schema(conn, definition.category())?;
                    Arc::clone(entry.insert(Arc::new(table)))
                }
            };

            by_name
                .entry(definition.name().to_string())
                .or_default()
                .push(index);
            by_types
                .entry((definition.from_type().clone(), definition.to_type().clone()))
                .or_default()
                .push(index);
            stores.push(RelationshipStore::new(definition, repo));
        }

        info!(
            relationships = stores.len(),
            tables = repos.len(),
            "relationship registry frozen"
        );
        Ok(Registry {
            tables: self.tables,
            stores,
            by_name,
            by_types,
        })
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Read-only catalog of relationship stores.
#[derive(Debug, Clone)]
pub struct Registry {
    tables: TableManager,
    stores: Vec<RelationshipStore>,
    by_name: HashMap<String, Vec<usize>>,
    by_types: HashMap<(EntityType, EntityType), Vec<usize>>,
}

impl Registry {
    /// Every store registered under `name`, in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError::NotFound`] if nothing uses the name.
    pub fn get_by_name(&self, name: &str) -> Result<Vec<&RelationshipStore>> {
        self.by_name
            .get(name)
            .map(|indexes| indexes.iter().map(|&i| &self.stores[i]).collect())
            .ok_or_else(|| RelationError::NotFound(name.to_string()))
    }

    /// The store for exactly `name` between `from_type` and `to_type`.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError::NotFound`] if no such definition exists.
    pub fn get(
        &self,
        name: &str,
        from_type: &EntityType,
        to_type: &EntityType,
    ) -> Result<&RelationshipStore> {
        self.stores
            .iter()
            .find(|store| store.definition().matches(name, from_type, to_type))
            .ok_or_else(|| RelationError::NotFound(format!("'{name}' ({from_type} -> {to_type})")))
    }

    /// Names registered between `from_type` and `to_type`, in registration
    /// order; empty if none.
    #[must_use]
    pub fn get_by_types(&self, from_type: &EntityType, to_type: &EntityType) -> Vec<&str> {
        self.by_types
            .get(&(from_type.clone(), to_type.clone()))
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&i| self.stores[i].definition().name())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All stores in registration order.
    #[must_use]
    pub fn stores(&self) -> &[RelationshipStore] {
        &self.stores
    }

    #[must_use]
    pub const fn tables(&self) -> &TableManager {
        &self.tables
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Remove every relationship row that references the deleted entity
    /// `id` of `entity_type`, on whichever side its type appears. Returns
    /// the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns a storage error; no rows are removed in that case.
    pub fn purge_entity(
        &self,
        conn: &Connection,
        entity_type: &EntityType,
        id: EntityId,
    ) -> Result<usize> {
        let removed = atomically(conn, |tx| {
            let mut removed = 0;
            for store in &self.stores {
                let definition = store.definition();
                if definition.from_type() == entity_type {
                    removed += store.purge(tx, id, Direction::From)?;
                }
                if definition.to_type() == entity_type {
                    removed += store.purge(tx, id, Direction::To)?;
                }
            }
            Ok(removed)
        })?;

        debug!(entity_type = %entity_type, id, removed, "purged entity relationships");
        Ok(removed)
    }
}
