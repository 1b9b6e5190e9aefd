use std::fmt;

use crate::model::EntityId;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidConfiguration,
    CardinalityViolation,
    ValidationFailed,
    RelationshipNotFound,
    SchemaCreateFailed,
    StorageFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidConfiguration => "E1001",
            Self::CardinalityViolation => "E2001",
            Self::ValidationFailed => "E2002",
            Self::RelationshipNotFound => "E2003",
            Self::SchemaCreateFailed => "E3001",
            Self::StorageFailed => "E3002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidConfiguration => "Invalid relationship configuration",
            Self::CardinalityViolation => "Cardinality would be violated",
            Self::ValidationFailed => "Validation failed",
            Self::RelationshipNotFound => "Relationship not found",
            Self::SchemaCreateFailed => "Join table creation failed",
            Self::StorageFailed => "Datastore operation failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidConfiguration => {
                Some("Fix the [[relationships]] entries in tether.toml and restart.")
            }
            Self::CardinalityViolation => {
                Some("Remove the existing link first, or use `replace` for the source entity.")
            }
            Self::ValidationFailed => {
                Some("Pass exactly the currently related IDs, each once per existing link.")
            }
            Self::RelationshipNotFound => Some("Run `tether relationships` to list registered names."),
            Self::SchemaCreateFailed => {
                Some("Check that the database is writable and the user may create tables.")
            }
            Self::StorageFailed => Some("Retry once. If persistent, inspect the database file."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors surfaced by the relationship engine.
#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    /// A definition or bootstrap setting is malformed or collides with an
    /// existing registration.
    #[error("invalid relationship configuration: {0}")]
    Configuration(String),

    /// A write would break the relationship's cardinality.
    #[error("cardinality violation on {relationship}: {from_id} -> {to_id}: {reason}")]
    CardinalityViolation {
        relationship: String,
        from_id: EntityId,
        to_id: EntityId,
        reason: String,
    },

    /// A reorder request does not match the stored relationship.
    #[error("invalid request on {relationship}: {reason}")]
    Validation { relationship: String, reason: String },

    /// No relationship is registered under the requested name.
    #[error("relationship not found: {0}")]
    NotFound(String),

    /// Creating a join table or its indexes failed.
    #[error("failed to create join table {table}: {source}")]
    Schema {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A datastore statement failed, including busy timeouts.
    #[error("{context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl RelationError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration(_) => ErrorCode::InvalidConfiguration,
            Self::CardinalityViolation { .. } => ErrorCode::CardinalityViolation,
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::NotFound(_) => ErrorCode::RelationshipNotFound,
            Self::Schema { .. } => ErrorCode::SchemaCreateFailed,
            Self::Storage { .. } => ErrorCode::StorageFailed,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    /// Whether the caller may recover (the request was rejected, the
    /// datastore is healthy).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CardinalityViolation { .. } | Self::Validation { .. } | Self::NotFound(_)
        )
    }
}

pub type Result<T, E = RelationError> = std::result::Result<T, E>;

/// Attach operation context to raw `rusqlite` failures.
pub(crate) trait StorageContext<T> {
    fn storage(self, context: &str) -> Result<T>;
}

impl<T> StorageContext<T> for rusqlite::Result<T> {
    fn storage(self, context: &str) -> Result<T> {
        self.map_err(|source| RelationError::Storage {
            context: context.to_string(),
            source,
        })
    }
}
