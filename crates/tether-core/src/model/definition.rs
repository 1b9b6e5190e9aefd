//! Relationship definitions: the immutable descriptor of how two entity
//! types may be linked.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::entity::{Category, EntityType};
use crate::error::RelationError;

// ---------------------------------------------------------------------------
// Cardinality
// ---------------------------------------------------------------------------

/// How many links may exist per entity on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    /// At most one row per `from_id` and at most one per `to_id`.
    OneToOne,
    /// At most one row per `to_id`; a `from_id` may own many.
    OneToMany,
    /// No per-side limit.
    ManyToMany,
}

impl Cardinality {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneToOne => "one-to-one",
            Self::OneToMany => "one-to-many",
            Self::ManyToMany => "many-to-many",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cardinality {
    type Err = RelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "one-to-one" | "1:1" => Ok(Self::OneToOne),
            "one-to-many" | "1:n" => Ok(Self::OneToMany),
            "many-to-many" | "n:n" | "m:n" => Ok(Self::ManyToMany),
            other => Err(RelationError::Configuration(format!(
                "unknown cardinality '{other}': expected one of one-to-one, one-to-many, many-to-many"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// RelationshipDefinition
// ---------------------------------------------------------------------------

/// A named, typed relationship between two entity types.
///
/// Definitions have no setters; `with_unique` consumes the value and is
/// meant to be chained right after [`RelationshipDefinition::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipDefinition {
    name: String,
    from_type: EntityType,
    to_type: EntityType,
    cardinality: Cardinality,
    ordered: bool,
    unique: bool,
}

impl RelationshipDefinition {
    /// Construct a definition.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError::Configuration`] if `name` is blank.
    pub fn new(
        name: impl Into<String>,
        from_type: EntityType,
        to_type: EntityType,
        cardinality: Cardinality,
        ordered: bool,
    ) -> Result<Self, RelationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(RelationError::Configuration(format!(
                "relationship name for {from_type} -> {to_type} must not be empty"
            )));
        }

        Ok(Self {
            name,
            from_type,
            to_type,
            cardinality,
            ordered,
            unique: false,
        })
    }

    /// Construct a definition from textual parts, as read from bootstrap
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError::Configuration`] if any part fails to parse.
    pub fn parse(
        name: &str,
        from_type: &str,
        to_type: &str,
        cardinality: &str,
        ordered: bool,
    ) -> Result<Self, RelationError> {
        Self::new(
            name,
            from_type.parse()?,
            to_type.parse()?,
            cardinality.parse()?,
            ordered,
        )
    }

    /// Reject duplicate `(from_id, to_id)` pairs on a many-to-many
    /// relationship. One-to-one and one-to-many already exclude them.
    #[must_use]
    pub const fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn from_type(&self) -> &EntityType {
        &self.from_type
    }

    #[must_use]
    pub const fn to_type(&self) -> &EntityType {
        &self.to_type
    }

    #[must_use]
    pub const fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    #[must_use]
    pub const fn is_ordered(&self) -> bool {
        self.ordered
    }

    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    /// The join-table category this definition's rows live in.
    #[must_use]
    pub const fn category(&self) -> Category {
        Category::new(self.from_type.domain(), self.to_type.domain())
    }

    /// Whether this definition occupies the `(name, from_type, to_type)` slot.
    #[must_use]
    pub fn matches(&self, name: &str, from_type: &EntityType, to_type: &EntityType) -> bool {
        self.name == name && &self.from_type == from_type && &self.to_type == to_type
    }
}

impl fmt::Display for RelationshipDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({} -> {})", self.name, self.from_type, self.to_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::EntityDomain;

    #[test]
    fn parses_cardinality_aliases() {
        assert_eq!("one_to_one".parse::<Cardinality>().ok(), Some(Cardinality::OneToOne));
        assert_eq!("1:n".parse::<Cardinality>().ok(), Some(Cardinality::OneToMany));
        assert_eq!(
            " Many-To-Many ".parse::<Cardinality>().ok(),
            Some(Cardinality::ManyToMany)
        );
    }

    #[test]
    fn unknown_cardinality_is_configuration_error() {
        let err = RelationshipDefinition::parse("x", "car", "tire", "some-to-few", false)
            .expect_err("bad cardinality");
        assert!(matches!(err, RelationError::Configuration(_)));
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = RelationshipDefinition::parse("  ", "car", "tire", "one-to-one", false)
            .expect_err("blank name");
        assert!(matches!(err, RelationError::Configuration(_)));
    }

    #[test]
    fn category_follows_endpoint_domains() {
        let def = RelationshipDefinition::parse("authors", "post:book", "user:author", "n:n", true)
            .expect("definition");
        assert_eq!(
            def.category(),
            Category::new(EntityDomain::Post, EntityDomain::User)
        );
        assert!(def.is_ordered());
        assert!(!def.is_unique());
        assert!(def.clone().with_unique(true).is_unique());
        assert_eq!(def.to_string(), "'authors' (post:book -> user:author)");
    }
}
