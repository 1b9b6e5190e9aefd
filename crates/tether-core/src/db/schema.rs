//! Canonical SQLite layout for relationship join tables.
//!
//! One join table exists per relationship category (`post_to_post`,
//! `post_to_user`, ...). Relationships of the same category share it and are
//! discriminated by `relationship_name` plus the endpoint type names:
//! - `(relationship_name, from_id)` serves forward lookups
//! - `(relationship_name, to_id)` serves reverse lookups
//! - the catalog table records which join tables have been ensured
//!
//! Table names are interpolated, so they must come from
//! [`super::tables::TableManager`], which validates the prefix.

/// Layout version stamped into the catalog for every ensured join table.
pub const JOIN_TABLE_SCHEMA_VERSION: u32 = 1;

/// Catalog of ensured join tables. `{catalog}` is replaced by the table name.
pub const CATALOG_SQL: &str = r"
CREATE TABLE IF NOT EXISTS {catalog} (
    table_name TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    schema_version INTEGER NOT NULL,
    created_at_us INTEGER NOT NULL
);
";

/// Join table plus its two lookup indexes. `{table}` is replaced by the
/// category table name.
pub const JOIN_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS {table} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_id INTEGER NOT NULL,
    to_id INTEGER NOT NULL,
    relationship_name TEXT NOT NULL CHECK (length(trim(relationship_name)) > 0),
    from_type TEXT NOT NULL,
    to_type TEXT NOT NULL,
    "order" INTEGER
);

CREATE INDEX IF NOT EXISTS idx_{table}_name_from
    ON {table}(relationship_name, from_id);

CREATE INDEX IF NOT EXISTS idx_{table}_name_to
    ON {table}(relationship_name, to_id);
"#;

/// DDL for the catalog table.
#[must_use]
pub fn catalog_ddl(catalog: &str) -> String {
    CATALOG_SQL.replace("{catalog}", catalog)
}

/// DDL for one category's join table and indexes.
#[must_use]
pub fn join_table_ddl(table: &str) -> String {
    JOIN_TABLE_SQL.replace("{table}", table)
}

/// Indexes every join table is expected to carry, forward then reverse.
#[must_use]
pub fn join_table_indexes(table: &str) -> [String; 2] {
    [
        format!("idx_{table}_name_from"),
        format!("idx_{table}_name_to"),
    ]
}

#[cfg(test)]
mod tests {
    use super::{join_table_ddl, join_table_indexes};
    use rusqlite::{Connection, params};

    const TABLE: &str = "tether_post_to_post";

    fn seeded_conn() -> rusqlite::Result<Connection> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&join_table_ddl(TABLE))?;

        for idx in 0..48_i64 {
            let name = if idx % 3 == 0 { "related" } else { "gallery" };
            conn.execute(
                "INSERT INTO tether_post_to_post
                    (from_id, to_id, relationship_name, from_type, to_type, \"order\")
                 VALUES (?1, ?2, ?3, 'car', 'tire', ?4)",
                params![idx % 7, 100 + idx, name, idx],
            )?;
        }

        Ok(conn)
    }

    fn query_plan_details(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!("EXPLAIN QUERY PLAN {sql}"))?;
        stmt.query_map([], |row| row.get::<_, String>(3))?
            .collect::<Result<Vec<_>, _>>()
    }

    #[test]
    fn forward_lookup_uses_name_from_index() -> rusqlite::Result<()> {
        let conn = seeded_conn()?;
        let details = query_plan_details(
            &conn,
            "SELECT to_id
             FROM tether_post_to_post
             WHERE relationship_name = 'gallery' AND from_id = 3
             ORDER BY \"order\", id",
        )?;

        assert!(
            details
                .iter()
                .any(|detail| detail.contains("idx_tether_post_to_post_name_from")),
            "expected forward index in plan, got: {details:?}"
        );

        Ok(())
    }

    #[test]
    fn reverse_lookup_uses_name_to_index() -> rusqlite::Result<()> {
        let conn = seeded_conn()?;
        let details = query_plan_details(
            &conn,
            "SELECT from_id
             FROM tether_post_to_post
             WHERE relationship_name = 'related' AND to_id = 103",
        )?;

        assert!(
            details
                .iter()
                .any(|detail| detail.contains("idx_tether_post_to_post_name_to")),
            "expected reverse index in plan, got: {details:?}"
        );

        Ok(())
    }

    #[test]
    fn ddl_is_rerunnable() -> rusqlite::Result<()> {
        let conn = seeded_conn()?;
        conn.execute_batch(&join_table_ddl(TABLE))?;

        let rows: i64 =
            conn.query_row("SELECT COUNT(*) FROM tether_post_to_post", [], |row| row.get(0))?;
        assert_eq!(rows, 48);

        for index in join_table_indexes(TABLE) {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?1)",
                params![index],
                |row| row.get(0),
            )?;
            assert!(exists, "missing index {index}");
        }

        Ok(())
    }

    #[test]
    fn blank_relationship_name_is_rejected_by_check() -> rusqlite::Result<()> {
        let conn = seeded_conn()?;
        let result = conn.execute(
            "INSERT INTO tether_post_to_post
                (from_id, to_id, relationship_name, from_type, to_type)
             VALUES (1, 2, '  ', 'car', 'tire')",
            [],
        );
        assert!(result.is_err());
        Ok(())
    }
}
