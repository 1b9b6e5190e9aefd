//! Physical join-table management.
//!
//! The [`TableManager`] maps each [`Category`] to exactly one table name
//! (`<prefix><from>_to_<to>`) and creates that table on demand. Creation is
//! idempotent: DDL uses `IF NOT EXISTS` and the catalog insert is
//! `INSERT OR IGNORE`, so ensuring a category any number of times leaves a
//! single physical table.

use rusqlite::{Connection, params};
use serde::Serialize;
use tracing::{debug, info};

use super::atomically;
use super::repository::SqliteJoinTable;
use super::schema::{JOIN_TABLE_SCHEMA_VERSION, catalog_ddl, join_table_ddl};
use crate::error::{RelationError, Result, StorageContext};
use crate::model::Category;

/// Prefix used when configuration does not name one.
pub const DEFAULT_TABLE_PREFIX: &str = "tether_";

/// A catalog row describing one ensured join table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub table_name: String,
    pub category: String,
    pub schema_version: u32,
    pub created_at_us: i64,
}

/// Owns the naming and creation of category join tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableManager {
    prefix: String,
}

impl Default for TableManager {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_TABLE_PREFIX.to_string(),
        }
    }
}

impl TableManager {
    /// Build a manager for `prefix`.
    ///
    /// The prefix is spliced into DDL, so it must be empty or an identifier
    /// fragment: ASCII letters, digits and `_`, not starting with a digit.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError::Configuration`] for any other prefix.
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        let valid_chars = prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
        let leading_digit = prefix.chars().next().is_some_and(|c| c.is_ascii_digit());
        if !valid_chars || leading_digit {
            return Err(RelationError::Configuration(format!(
                "table prefix '{prefix}' must contain only ASCII letters, digits and '_' \
                 and must not start with a digit"
            )));
        }
        Ok(Self { prefix })
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Table shared by every relationship in `category`.
    #[must_use]
    pub fn table_name(&self, category: Category) -> String {
        format!("{}{}", self.prefix, category.slug())
    }

    /// Table recording which join tables have been ensured.
    #[must_use]
    pub fn catalog_table(&self) -> String {
        format!("{}tables", self.prefix)
    }

    /// Create the category's join table and indexes if absent, and record
    /// it in the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`RelationError::Schema`] if any DDL statement fails, or a
    /// storage error if the surrounding transaction cannot be opened. The
    /// failure is not retried.
    pub fn ensure_schema(&self, conn: &Connection, category: Category) -> Result<SqliteJoinTable> {
        let table = self.table_name(category);
        let schema_err = |source: rusqlite::Error| RelationError::Schema {
            table: table.clone(),
            source,
        };

        let inserted = atomically(conn, |tx| {
            let create = || -> rusqlite::Result<usize> {
                tx.execute_batch(&catalog_ddl(&self.catalog_table()))?;
                tx.execute_batch(&join_table_ddl(&table))?;
                tx.execute(
                    &format!(
                        "INSERT OR IGNORE INTO {} (table_name, category, schema_version, created_at_us) \
                         VALUES (?1, ?2, ?3, ?4)",
                        self.catalog_table()
                    ),
                    params![
                        table,
                        category.to_string(),
                        JOIN_TABLE_SCHEMA_VERSION,
                        chrono::Utc::now().timestamp_micros()
                    ],
                )
            };
            create().map_err(schema_err)
        })?;

        if inserted > 0 {
            info!(table = %table, category = %category, "created join table");
        } else {
            debug!(table = %table, "join table already present");
        }

        Ok(SqliteJoinTable::new(table))
    }

    /// Whether the category's physical table exists.
    ///
    /// # Errors
    ///
    /// Returns a storage error if `sqlite_master` cannot be read.
    pub fn table_exists(&self, conn: &Connection, category: Category) -> Result<bool> {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            params![self.table_name(category)],
            |row| row.get(0),
        )
        .storage("look up join table")
    }

    /// Catalog rows for every ensured join table, by table name. Empty when
    /// nothing has been ensured yet.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the catalog cannot be read.
    pub fn ensured_tables(&self, conn: &Connection) -> Result<Vec<CatalogEntry>> {
        let catalog = self.catalog_table();
        let catalog_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                params![catalog],
                |row| row.get(0),
            )
            .storage("look up table catalog")?;
        if !catalog_exists {
            return Ok(Vec::new());
        }

        let mut stmt = conn
            .prepare(&format!(
                "SELECT table_name, category, schema_version, created_at_us \
                 FROM {catalog} ORDER BY table_name"
            ))
            .storage("prepare catalog query")?;
        let entries = stmt
            .query_map([], |row| {
                Ok(CatalogEntry {
                    table_name: row.get(0)?,
                    category: row.get(1)?,
                    schema_version: row.get(2)?,
                    created_at_us: row.get(3)?,
                })
            })
            .storage("query table catalog")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .storage("read table catalog")?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_TABLE_PREFIX, TableManager};
    use crate::db::repository::JoinRepository;
    use crate::db::schema::JOIN_TABLE_SCHEMA_VERSION;
    use crate::error::RelationError;
    use crate::model::{Category, EntityDomain};
    use rusqlite::Connection;

    const POST_TO_USER: Category = Category::new(EntityDomain::Post, EntityDomain::User);

    #[test]
    fn names_follow_prefix_and_category() {
        let tables = TableManager::default();
        assert_eq!(tables.prefix(), DEFAULT_TABLE_PREFIX);
        assert_eq!(tables.table_name(POST_TO_USER), "tether_post_to_user");
        assert_eq!(tables.catalog_table(), "tether_tables");

        let bare = TableManager::new("").expect("empty prefix");
        assert_eq!(bare.table_name(POST_TO_USER), "post_to_user");
    }

    #[test]
    fn rejects_prefix_that_is_not_an_identifier() {
        for bad in ["wp-", "1st_", "x; DROP TABLE y; --", "a b"] {
            let err = TableManager::new(bad).expect_err("bad prefix");
            assert!(matches!(err, RelationError::Configuration(_)), "{bad}");
        }
        assert!(TableManager::new("wp_").is_ok());
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().expect("open");
        let tables = TableManager::default();

        for _ in 0..4 {
            let repo = tables.ensure_schema(&conn, POST_TO_USER).expect("ensure");
            assert_eq!(repo.table(), "tether_post_to_user");
        }

        let physical: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'tether_post_to_user'",
                [],
                |row| row.get(0),
            )
            .expect("count tables");
        assert_eq!(physical, 1);

        let entries = tables.ensured_tables(&conn).expect("catalog");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, "post-to-user");
        assert_eq!(entries[0].schema_version, JOIN_TABLE_SCHEMA_VERSION);
    }

    #[test]
    fn table_exists_tracks_creation() {
        let conn = Connection::open_in_memory().expect("open");
        let tables = TableManager::new("wp_").expect("prefix");

        assert!(!tables.table_exists(&conn, POST_TO_USER).expect("exists"));
        assert!(tables.ensured_tables(&conn).expect("catalog").is_empty());
        tables.ensure_schema(&conn, POST_TO_USER).expect("ensure");
        assert!(tables.table_exists(&conn, POST_TO_USER).expect("exists"));
    }

    #[test]
    fn creation_failure_is_schema_error() {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch("CREATE VIEW tether_post_to_user AS SELECT 1 AS from_id")
            .expect("shadowing view");

        let err = TableManager::default()
            .ensure_schema(&conn, POST_TO_USER)
            .expect_err("views cannot be indexed");
        assert!(matches!(err, RelationError::Schema { .. }));
        assert!(TableManager::default().ensured_tables(&conn).expect("catalog").is_empty());
    }
}
