//! tether-core library.
//!
//! Typed relationships between content entities, stored in one indexed
//! SQLite join table per relationship category.
//!
//! # Conventions
//!
//! - **Errors**: Library operations return [`RelationError`]; config loading
//!   returns `anyhow::Result` with file context.
//! - **Logging**: Use `tracing` macros (`info!` for registration and schema
//!   creation, `debug!` for writes, `warn!` for rejected writes).
//! - **Connections**: Every operation borrows the caller's
//!   `rusqlite::Connection`; nothing in this crate holds one.
//!
//! ```no_run
//! use tether_core::{Direction, RegistryBuilder, RelationshipDefinition};
//!
//! # fn main() -> anyhow::Result<()> {
//! let conn = tether_core::db::open(std::path::Path::new("tether.db"), tether_core::db::DEFAULT_BUSY_TIMEOUT)?;
//! let mut builder = RegistryBuilder::new();
//! builder.register(RelationshipDefinition::parse(
//!     "related-cars", "post:car", "post:tire", "one-to-many", true,
//! )?)?;
//! let registry = builder.freeze(&conn)?;
//!
//! let store = registry.get_by_name("related-cars")?[0];
//! store.add(&conn, 1, 10)?;
//! assert_eq!(store.get_related_ids(&conn, 1, Direction::From)?, vec![10]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod query;
pub mod registry;
pub mod store;

pub use error::{ErrorCode, RelationError, Result};
pub use model::{
    Cardinality, Category, Direction, EntityDomain, EntityId, EntityType, RelationshipDefinition,
    RelationshipRow,
};
pub use query::{TypeResolver, get_related_ids_by_name};
pub use registry::{Registry, RegistryBuilder};
pub use store::RelationshipStore;
