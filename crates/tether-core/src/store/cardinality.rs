//! Cardinality enforcement.
//!
//! Each [`Cardinality`] selects a [`CardinalityRule`] that inspects the rows
//! already stored and vetoes an insert that would break the constraint. The
//! store runs the rule and the insert inside one write transaction.

use rusqlite::Connection;

use crate::db::repository::{JoinRepository, RowKey};
use crate::error::Result;
use crate::model::{Cardinality, Direction, EntityId};

/// Pre-insert check shared by every cardinality kind.
pub trait CardinalityRule: Sync {
    /// Return `Some(reason)` if linking `from_id -> to_id` is not allowed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the existing rows cannot be inspected.
    fn violation(
        &self,
        repo: &dyn JoinRepository,
        conn: &Connection,
        key: RowKey<'_>,
        from_id: EntityId,
        to_id: EntityId,
    ) -> Result<Option<String>>;
}

/// One link per `from_id`, one link per `to_id`.
#[derive(Debug, Clone, Copy)]
pub struct OneToOne;

/// One link per `to_id`.
#[derive(Debug, Clone, Copy)]
pub struct OneToMany;

/// No per-side limit; optionally no repeated pair.
#[derive(Debug, Clone, Copy)]
pub struct ManyToMany {
    pub unique: bool,
}

impl CardinalityRule for OneToOne {
    fn violation(
        &self,
        repo: &dyn JoinRepository,
        conn: &Connection,
        key: RowKey<'_>,
        from_id: EntityId,
        to_id: EntityId,
    ) -> Result<Option<String>> {
        if repo.count(conn, key, from_id, Direction::From)? > 0 {
            return Ok(Some(format!("{from_id} is already linked")));
        }
        if repo.count(conn, key, to_id, Direction::To)? > 0 {
            return Ok(Some(format!("{to_id} is already linked")));
        }
        Ok(None)
    }
}

impl CardinalityRule for OneToMany {
    fn violation(
        &self,
        repo: &dyn JoinRepository,
        conn: &Connection,
        key: RowKey<'_>,
        _from_id: EntityId,
        to_id: EntityId,
    ) -> Result<Option<String>> {
        if repo.count(conn, key, to_id, Direction::To)? > 0 {
            return Ok(Some(format!("{to_id} already belongs to another entity")));
        }
        Ok(None)
    }
}

impl CardinalityRule for ManyToMany {
    fn violation(
        &self,
        repo: &dyn JoinRepository,
        conn: &Connection,
        key: RowKey<'_>,
        from_id: EntityId,
        to_id: EntityId,
    ) -> Result<Option<String>> {
        if self.unique && repo.pair_exists(conn, key, from_id, to_id)? {
            return Ok(Some("pair already linked and duplicates are disabled".into()));
        }
        Ok(None)
    }
}

static ONE_TO_ONE: OneToOne = OneToOne;
static ONE_TO_MANY: OneToMany = OneToMany;
static MANY_TO_MANY: ManyToMany = ManyToMany { unique: false };
static MANY_TO_MANY_UNIQUE: ManyToMany = ManyToMany { unique: true };

impl Cardinality {
    /// The rule enforcing this cardinality. `unique` only affects
    /// many-to-many.
    #[must_use]
    pub fn rule(self, unique: bool) -> &'static dyn CardinalityRule {
        match (self, unique) {
            (Self::OneToOne, _) => &ONE_TO_ONE,
            (Self::OneToMany, _) => &ONE_TO_MANY,
            (Self::ManyToMany, false) => &MANY_TO_MANY,
            (Self::ManyToMany, true) => &MANY_TO_MANY_UNIQUE,
        }
    }
}
