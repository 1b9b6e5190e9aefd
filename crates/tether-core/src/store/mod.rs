//! Relationship stores: reads and writes for one definition's join rows.
//!
//! A [`RelationshipStore`] pairs an immutable definition with the
//! repository for its category table. It holds no connection; every
//! operation takes the caller's `&Connection`, so a frozen registry of
//! stores can be shared across threads while each request brings its own
//! connection.
//!
//! # Invariants
//!
//! - Writes that depend on a read (`add`, `replace`, `reorder`) run inside
//!   one write transaction, so cardinality checks cannot race an insert.
//! - `replace` never exposes an empty intermediate state: the delete and
//!   the inserts commit together or not at all.
//! - `remove` of a missing pair succeeds with a count of zero.

pub mod cardinality;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use rusqlite::Connection;
use tracing::{debug, warn};

use crate::db::atomically;
use crate::db::repository::{JoinRepository, RowKey};
use crate::error::{RelationError, Result};
use crate::model::{Direction, EntityId, RelationshipDefinition, RelationshipRow};

/// CRUD over the join rows of a single relationship definition.
#[derive(Debug, Clone)]
pub struct RelationshipStore {
    definition: Arc<RelationshipDefinition>,
    repo: Arc<dyn JoinRepository>,
}

impl RelationshipStore {
    #[must_use]
    pub fn new(definition: RelationshipDefinition, repo: Arc<dyn JoinRepository>) -> Self {
        Self {
            definition: Arc::new(definition),
            repo,
        }
    }

    #[must_use]
    pub fn definition(&self) -> &RelationshipDefinition {
        &self.definition
    }

    /// Name of the shared category table backing this store.
    #[must_use]
    pub fn table(&self) -> &str {
        self.repo.table()
    }

    fn key(&self) -> RowKey<'_> {
        RowKey::of(&self.definition)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Link `from_id` to `to_id`, enforcing cardinality.
    ///
    /// Ordered relationships append: the new row's `order` is one past the
    /// highest order among `from_id`'s rows, or 0 for its first row.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError::CardinalityViolation`] if the link is not
    /// allowed, or a storage error.
    pub fn add(
        &self,
        conn: &Connection,
        from_id: EntityId,
        to_id: EntityId,
    ) -> Result<RelationshipRow> {
        let row = atomically(conn, |tx| self.insert_checked(tx, from_id, to_id))?;
        debug!(
            relationship = %self.definition,
            from_id,
            to_id,
            order = ?row.order,
            "added relationship row"
        );
        Ok(row)
    }

    /// Unlink `from_id` from `to_id`; returns how many rows were deleted.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the delete fails. A missing pair is not an
    /// error.
    pub fn remove(&self, conn: &Connection, from_id: EntityId, to_id: EntityId) -> Result<usize> {
        let removed = self.repo.delete_pair(conn, self.key(), from_id, to_id)?;
        debug!(relationship = %self.definition, from_id, to_id, removed, "removed relationship");
        Ok(removed)
    }

    /// Make `to_ids` the complete, ordered set of links for `from_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError::CardinalityViolation`] if any link is not
    /// allowed; the previous links are then left untouched.
    pub fn replace(
        &self,
        conn: &Connection,
        from_id: EntityId,
        to_ids: &[EntityId],
    ) -> Result<Vec<RelationshipRow>> {
        let rows = atomically(conn, |tx| {
            let removed = self
                .repo
                .delete_side(tx, self.key(), from_id, Direction::From)?;
            debug!(relationship = %self.definition, from_id, removed, "cleared before replace");
            to_ids
                .iter()
                .map(|&to_id| self.insert_checked(tx, from_id, to_id))
                .collect::<Result<Vec<_>>>()
        })?;
        debug!(
            relationship = %self.definition,
            from_id,
            count = rows.len(),
            "replaced relationship rows"
        );
        Ok(rows)
    }

    /// Rewrite the `order` of `from_id`'s links to follow `ordered_to_ids`.
    ///
    /// The list must hold exactly the currently related IDs, each as many
    /// times as it is linked.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError::Validation`] if the relationship is not
    /// ordered or the IDs do not match; nothing is changed in that case.
    pub fn reorder(
        &self,
        conn: &Connection,
        from_id: EntityId,
        ordered_to_ids: &[EntityId],
    ) -> Result<()> {
        if !self.definition.is_ordered() {
            return Err(self.invalid("relationship is not ordered".into()));
        }

        atomically(conn, |tx| {
            let current = self
                .repo
                .rows(tx, self.key(), from_id, Direction::From, true)?;

            let mut expected: Vec<EntityId> = current.iter().map(|row| row.to_id).collect();
            let mut supplied = ordered_to_ids.to_vec();
            expected.sort_unstable();
            supplied.sort_unstable();
            if expected != supplied {
                return Err(self.invalid(format!(
                    "reorder of {from_id} must list exactly its {} related IDs, got {}",
                    current.len(),
                    ordered_to_ids.len()
                )));
            }

            let mut row_ids: HashMap<EntityId, VecDeque<i64>> = HashMap::new();
            for row in &current {
                row_ids.entry(row.to_id).or_default().push_back(row.id);
            }
            for (position, to_id) in (0_i64..).zip(ordered_to_ids) {
                if let Some(row_id) = row_ids.get_mut(to_id).and_then(VecDeque::pop_front) {
                    self.repo.set_order(tx, row_id, position)?;
                }
            }
            Ok(())
        })?;

        debug!(relationship = %self.definition, from_id, "reordered relationship rows");
        Ok(())
    }

    /// Delete every row with `id` on the `direction` side; returns the count.
    /// Used when the referenced entity is deleted.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the delete fails.
    pub fn purge(&self, conn: &Connection, id: EntityId, direction: Direction) -> Result<usize> {
        self.repo.delete_side(conn, self.key(), id, direction)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// IDs related to `id` when traversing in `direction`.
    ///
    /// Forward traversal of an ordered relationship follows `order`; all
    /// other traversals follow insertion order. Empty when nothing is linked.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub fn get_related_ids(
        &self,
        conn: &Connection,
        id: EntityId,
        direction: Direction,
    ) -> Result<Vec<EntityId>> {
        Ok(self
            .rows(conn, id, direction)?
            .iter()
            .map(|row| row.related_id(direction))
            .collect())
    }

    /// Full rows for `id`, in the same order as [`Self::get_related_ids`].
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub fn rows(
        &self,
        conn: &Connection,
        id: EntityId,
        direction: Direction,
    ) -> Result<Vec<RelationshipRow>> {
        self.repo
            .rows(conn, self.key(), id, direction, self.definition.is_ordered())
    }

    /// Number of rows with `id` on the `direction` side.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub fn count(&self, conn: &Connection, id: EntityId, direction: Direction) -> Result<usize> {
        self.repo.count(conn, self.key(), id, direction)
    }

    /// Whether `from_id` is linked to `to_id`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub fn contains(&self, conn: &Connection, from_id: EntityId, to_id: EntityId) -> Result<bool> {
        self.repo.pair_exists(conn, self.key(), from_id, to_id)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn insert_checked(
        &self,
        conn: &Connection,
        from_id: EntityId,
        to_id: EntityId,
    ) -> Result<RelationshipRow> {
        let def = &self.definition;
        let rule = def.cardinality().rule(def.is_unique());
        if let Some(reason) = rule.violation(self.repo.as_ref(), conn, self.key(), from_id, to_id)? {
            warn!(relationship = %def, from_id, to_id, %reason, "rejected relationship write");
            return Err(RelationError::CardinalityViolation {
                relationship: def.to_string(),
                from_id,
                to_id,
                reason,
            });
        }

        let order = if def.is_ordered() {
            Some(
                self.repo
                    .max_order(conn, self.key(), from_id)?
                    .map_or(0, |max| max + 1),
            )
        } else {
            None
        };

        self.repo.insert(conn, self.key(), from_id, to_id, order)
    }

    fn invalid(&self, reason: String) -> RelationError {
        warn!(relationship = %self.definition, %reason, "rejected relationship request");
        RelationError::Validation {
            relationship: self.definition.to_string(),
            reason,
        }
    }
}
