use serde::Serialize;

use super::entity::{Direction, EntityId};

/// A physical join row as stored in a category table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipRow {
    pub id: i64,
    pub from_id: EntityId,
    pub to_id: EntityId,
    pub relationship_name: String,
    /// Explicit position among the `from_id`'s links; `None` unless the
    /// relationship is ordered.
    pub order: Option<i64>,
}

impl RelationshipRow {
    /// The ID on the far side of a row reached by querying in `direction`.
    #[must_use]
    pub const fn related_id(&self, direction: Direction) -> EntityId {
        match direction {
            Direction::From => self.to_id,
            Direction::To => self.from_id,
        }
    }
}
