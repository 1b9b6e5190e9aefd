//! Domain types: entity types, relationship definitions, and join rows.

pub mod definition;
pub mod entity;
pub mod row;

pub use definition::{Cardinality, RelationshipDefinition};
pub use entity::{Category, Direction, EntityDomain, EntityId, EntityType};
pub use row::RelationshipRow;
