//! Read-only convenience lookups across every store sharing a name.

use std::collections::HashSet;

use rusqlite::Connection;

use crate::error::Result;
use crate::model::{Direction, EntityId, EntityType};
use crate::registry::Registry;

/// Answers which entity types an ID belongs to.
///
/// Entity IDs are only unique within a type, so the façade asks this before
/// following either side of a relationship.
pub trait TypeResolver {
    fn is_a(&self, id: EntityId, entity_type: &EntityType) -> bool;
}

/// `id` is known to be exactly this type.
impl TypeResolver for EntityType {
    fn is_a(&self, _id: EntityId, entity_type: &EntityType) -> bool {
        self == entity_type
    }
}

/// `id` is known to be any of these types.
impl TypeResolver for [EntityType] {
    fn is_a(&self, _id: EntityId, entity_type: &EntityType) -> bool {
        self.contains(entity_type)
    }
}

/// IDs related to `id` through any relationship called `name`.
///
/// A store's forward side is followed when `id` is a `from_type`, its
/// reverse side when `id` is a `to_type`. Stores are visited in
/// registration order, forward results before reverse ones. Repeats are
/// dropped, keeping the first occurrence.
///
/// # Errors
///
/// Returns [`crate::RelationError::NotFound`] for an unknown name, or a
/// storage error.
pub fn get_related_ids_by_name<R>(
    registry: &Registry,
    conn: &Connection,
    resolver: &R,
    id: EntityId,
    name: &str,
) -> Result<Vec<EntityId>>
where
    R: TypeResolver + ?Sized,
{
    let mut seen = HashSet::new();
    let mut related = Vec::new();

    for store in registry.get_by_name(name)? {
        let definition = store.definition();
        for direction in [Direction::From, Direction::To] {
            let queried_side = match direction {
                Direction::From => definition.from_type(),
                Direction::To => definition.to_type(),
            };
            if !resolver.is_a(id, queried_side) {
                continue;
            }
            for related_id in store.get_related_ids(conn, id, direction)? {
                if seen.insert(related_id) {
                    related.push(related_id);
                }
            }
        }
    }

    Ok(related)
}
