//! Entity types, traversal direction, and relationship categories.
//!
//! An [`EntityType`] is a semantic type slug (a post type such as `car`, a
//! user role, a taxonomy) tagged with the [`EntityDomain`] its IDs live in.
//! The textual form is `<domain>:<name>`; a bare name means the `post`
//! domain, which is what most bootstrap files declare.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::RelationError;

/// Integer identifier of a post, user, or term.
pub type EntityId = i64;

// ---------------------------------------------------------------------------
// EntityDomain
// ---------------------------------------------------------------------------

/// The ID space an entity type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityDomain {
    Post,
    User,
    Term,
}

impl EntityDomain {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::User => "user",
            Self::Term => "term",
        }
    }
}

impl fmt::Display for EntityDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityDomain {
    type Err = RelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "post" | "posts" => Ok(Self::Post),
            "user" | "users" => Ok(Self::User),
            "term" | "terms" => Ok(Self::Term),
            other => Err(RelationError::Configuration(format!(
                "unknown entity domain '{other}': expected one of post, user, term"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// A domain-tagged entity type slug, e.g. `post:car` or `user:author`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityType {
    domain: EntityDomain,
    name: String,
}

impl EntityType {
    /// Build an entity type, rejecting blank names and names containing `:`.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError::Configuration`] if `name` is unusable.
    pub fn new(domain: EntityDomain, name: impl Into<String>) -> Result<Self, RelationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RelationError::Configuration(format!(
                "entity type name in domain '{domain}' must not be empty"
            )));
        }
        if trimmed.contains(':') {
            return Err(RelationError::Configuration(format!(
                "entity type name '{trimmed}' must not contain ':'"
            )));
        }
        Ok(Self {
            domain,
            name: trimmed.to_string(),
        })
    }

    /// Shorthand for a post type.
    ///
    /// # Errors
    ///
    /// See [`EntityType::new`].
    pub fn post(name: impl Into<String>) -> Result<Self, RelationError> {
        Self::new(EntityDomain::Post, name)
    }

    /// Shorthand for a term type.
    ///
    /// # Errors
    ///
    /// See [`EntityType::new`].
    pub fn term(name: impl Into<String>) -> Result<Self, RelationError> {
        Self::new(EntityDomain::Term, name)
    }

    #[must_use]
    pub const fn domain(&self) -> EntityDomain {
        self.domain
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.name)
    }
}

impl FromStr for EntityType {
    type Err = RelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((domain, name)) => Self::new(domain.parse()?, name),
            None => Self::post(s),
        }
    }
}

impl Serialize for EntityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Which side of a relationship row the queried ID sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The ID is the row's `from_id`; related IDs are `to_id`s.
    #[default]
    From,
    /// The ID is the row's `to_id`; related IDs are `from_id`s.
    To,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::From => "from",
            Self::To => "to",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = RelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "from" | "forward" => Ok(Self::From),
            "to" | "reverse" | "inverse" => Ok(Self::To),
            other => Err(RelationError::Configuration(format!(
                "unknown direction '{other}': expected 'from' or 'to'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The domain pair of a relationship. Every category owns one join table,
/// shared by all relationships whose endpoints live in those domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Category {
    pub from: EntityDomain,
    pub to: EntityDomain,
}

impl Category {
    #[must_use]
    pub const fn new(from: EntityDomain, to: EntityDomain) -> Self {
        Self { from, to }
    }

    /// `post_to_user`-style slug used in table names.
    #[must_use]
    pub fn slug(self) -> String {
        format!("{}_to_{}", self.from, self.to)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-to-{}", self.from, self.to)
    }
}
