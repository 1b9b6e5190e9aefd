//! Repository interface over one category's join table.
//!
//! Stores never build SQL themselves; they go through [`JoinRepository`],
//! scoped to their own rows by a [`RowKey`]. [`SqliteJoinTable`] is the
//! parameterized-SQL implementation. All statements bind values; only the
//! validated table name is interpolated.

use std::fmt;

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{Result, StorageContext};
use crate::model::{Direction, EntityId, RelationshipDefinition, RelationshipRow};

/// Discriminates one definition's rows inside a shared category table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowKey<'a> {
    pub name: &'a str,
    pub from_type: &'a str,
    pub to_type: &'a str,
}

impl<'a> RowKey<'a> {
    #[must_use]
    pub fn of(definition: &'a RelationshipDefinition) -> Self {
        Self {
            name: definition.name(),
            from_type: definition.from_type().name(),
            to_type: definition.to_type().name(),
        }
    }
}

/// Row-level operations a relationship store needs from its join table.
pub trait JoinRepository: fmt::Debug + Send + Sync {
    /// Physical table backing this repository.
    fn table(&self) -> &str;

    /// Insert a row and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the insert fails.
    fn insert(
        &self,
        conn: &Connection,
        key: RowKey<'_>,
        from_id: EntityId,
        to_id: EntityId,
        order: Option<i64>,
    ) -> Result<RelationshipRow>;

    /// Delete every row linking `from_id` to `to_id`; returns the count.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the delete fails.
    fn delete_pair(
        &self,
        conn: &Connection,
        key: RowKey<'_>,
        from_id: EntityId,
        to_id: EntityId,
    ) -> Result<usize>;

    /// Delete every row with `id` on the `direction` side; returns the count.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the delete fails.
    fn delete_side(
        &self,
        conn: &Connection,
        key: RowKey<'_>,
        id: EntityId,
        direction: Direction,
    ) -> Result<usize>;

    /// Rows with `id` on the `direction` side. Forward lookups on ordered
    /// relationships sort by `order`, then row id; everything else sorts by
    /// row id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    fn rows(
        &self,
        conn: &Connection,
        key: RowKey<'_>,
        id: EntityId,
        direction: Direction,
        ordered: bool,
    ) -> Result<Vec<RelationshipRow>>;

    /// Number of rows with `id` on the `direction` side.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    fn count(
        &self,
        conn: &Connection,
        key: RowKey<'_>,
        id: EntityId,
        direction: Direction,
    ) -> Result<usize>;

    /// Whether at least one row links `from_id` to `to_id`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    fn pair_exists(
        &self,
        conn: &Connection,
        key: RowKey<'_>,
        from_id: EntityId,
        to_id: EntityId,
    ) -> Result<bool>;

    /// Highest `order` among `from_id`'s rows, `None` when it has none.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    fn max_order(&self, conn: &Connection, key: RowKey<'_>, from_id: EntityId)
    -> Result<Option<i64>>;

    /// Overwrite the `order` of one row by surrogate id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the update fails.
    fn set_order(&self, conn: &Connection, row_id: i64, order: i64) -> Result<()>;
}

// ---------------------------------------------------------------------------
// SqliteJoinTable
// ---------------------------------------------------------------------------

/// [`JoinRepository`] over a SQLite category table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteJoinTable {
    table: String,
}

const ROW_COLUMNS: &str = "id, from_id, to_id, relationship_name, \"order\"";
const KEY_FILTER: &str = "relationship_name = ?1 AND from_type = ?2 AND to_type = ?3";

impl SqliteJoinTable {
    /// Wrap an already-validated table name. Use
    /// [`super::tables::TableManager::ensure_schema`] to obtain one.
    pub(crate) const fn new(table: String) -> Self {
        Self { table }
    }

    const fn side_column(direction: Direction) -> &'static str {
        match direction {
            Direction::From => "from_id",
            Direction::To => "to_id",
        }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RelationshipRow> {
        Ok(RelationshipRow {
            id: row.get(0)?,
            from_id: row.get(1)?,
            to_id: row.get(2)?,
            relationship_name: row.get(3)?,
            order: row.get(4)?,
        })
    }
}

impl JoinRepository for SqliteJoinTable {
    fn table(&self) -> &str {
        &self.table
    }

    fn insert(
        &self,
        conn: &Connection,
        key: RowKey<'_>,
        from_id: EntityId,
        to_id: EntityId,
        order: Option<i64>,
    ) -> Result<RelationshipRow> {
        let sql = format!(
            "INSERT INTO {} (from_id, to_id, relationship_name, from_type, to_type, \"order\") \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            self.table
        );
        conn.execute(
            &sql,
            params![from_id, to_id, key.name, key.from_type, key.to_type, order],
        )
        .storage("insert relationship row")?;

        Ok(RelationshipRow {
            id: conn.last_insert_rowid(),
            from_id,
            to_id,
            relationship_name: key.name.to_string(),
            order,
        })
    }

    fn delete_pair(
        &self,
        conn: &Connection,
        key: RowKey<'_>,
        from_id: EntityId,
        to_id: EntityId,
    ) -> Result<usize> {
        let sql = format!(
            "DELETE FROM {} WHERE {KEY_FILTER} AND from_id = ?4 AND to_id = ?5",
            self.table
        );
        conn.execute(
            &sql,
            params![key.name, key.from_type, key.to_type, from_id, to_id],
        )
        .storage("delete relationship pair")
    }

    fn delete_side(
        &self,
        conn: &Connection,
        key: RowKey<'_>,
        id: EntityId,
        direction: Direction,
    ) -> Result<usize> {
        let sql = format!(
            "DELETE FROM {} WHERE {KEY_FILTER} AND {} = ?4",
            self.table,
            Self::side_column(direction)
        );
        conn.execute(&sql, params![key.name, key.from_type, key.to_type, id])
            .storage("delete relationship rows")
    }

    fn rows(
        &self,
        conn: &Connection,
        key: RowKey<'_>,
        id: EntityId,
        direction: Direction,
        ordered: bool,
    ) -> Result<Vec<RelationshipRow>> {
        let order_clause = if ordered && direction == Direction::From {
            "ORDER BY \"order\" ASC, id ASC"
        } else {
            "ORDER BY id ASC"
        };
        let sql = format!(
            "SELECT {ROW_COLUMNS} FROM {} WHERE {KEY_FILTER} AND {} = ?4 {order_clause}",
            self.table,
            Self::side_column(direction)
        );

        let mut stmt = conn.prepare(&sql).storage("prepare relationship lookup")?;
        let rows = stmt
            .query_map(
                params![key.name, key.from_type, key.to_type, id],
                Self::map_row,
            )
            .storage("query relationship rows")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .storage("read relationship rows")?;
        Ok(rows)
    }

    fn count(
        &self,
        conn: &Connection,
        key: RowKey<'_>,
        id: EntityId,
        direction: Direction,
    ) -> Result<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {KEY_FILTER} AND {} = ?4",
            self.table,
            Self::side_column(direction)
        );
        let count: i64 = conn
            .query_row(&sql, params![key.name, key.from_type, key.to_type, id], |row| {
                row.get(0)
            })
            .storage("count relationship rows")?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn pair_exists(
        &self,
        conn: &Connection,
        key: RowKey<'_>,
        from_id: EntityId,
        to_id: EntityId,
    ) -> Result<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {KEY_FILTER} AND from_id = ?4 AND to_id = ?5)",
            self.table
        );
        conn.query_row(
            &sql,
            params![key.name, key.from_type, key.to_type, from_id, to_id],
            |row| row.get(0),
        )
        .storage("check relationship pair")
    }

    fn max_order(
        &self,
        conn: &Connection,
        key: RowKey<'_>,
        from_id: EntityId,
    ) -> Result<Option<i64>> {
        let sql = format!(
            "SELECT MAX(\"order\") FROM {} WHERE {KEY_FILTER} AND from_id = ?4",
            self.table
        );
        let max: Option<Option<i64>> = conn
            .query_row(
                &sql,
                params![key.name, key.from_type, key.to_type, from_id],
                |row| row.get(0),
            )
            .optional()
            .storage("read max relationship order")?;
        Ok(max.flatten())
    }

    fn set_order(&self, conn: &Connection, row_id: i64, order: i64) -> Result<()> {
        let sql = format!("UPDATE {} SET \"order\" = ?1 WHERE id = ?2", self.table);
        conn.execute(&sql, params![order, row_id])
            .storage("update relationship order")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{JoinRepository, RowKey, SqliteJoinTable};
    use crate::db::schema::join_table_ddl;
    use crate::model::Direction;
    use rusqlite::Connection;

    const CAR: RowKey<'static> = RowKey {
        name: "fits",
        from_type: "car",
        to_type: "tire",
    };
    const BIKE: RowKey<'static> = RowKey {
        name: "fits",
        from_type: "bike",
        to_type: "tire",
    };

    fn table() -> (Connection, SqliteJoinTable) {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch(&join_table_ddl("t_post_to_post"))
            .expect("ddl");
        (conn, SqliteJoinTable::new("t_post_to_post".into()))
    }

    #[test]
    fn rows_are_scoped_by_key() {
        let (conn, repo) = table();
        repo.insert(&conn, CAR, 1, 10, None).expect("car row");
        repo.insert(&conn, BIKE, 1, 20, None).expect("bike row");

        let car_rows = repo
            .rows(&conn, CAR, 1, Direction::From, false)
            .expect("car rows");
        assert_eq!(car_rows.len(), 1);
        assert_eq!(car_rows[0].to_id, 10);
        assert_eq!(repo.count(&conn, BIKE, 20, Direction::To).expect("count"), 1);
        assert_eq!(repo.count(&conn, CAR, 20, Direction::To).expect("count"), 0);
    }

    #[test]
    fn forward_rows_follow_order_when_ordered() {
        let (conn, repo) = table();
        repo.insert(&conn, CAR, 1, 10, Some(2)).expect("insert");
        repo.insert(&conn, CAR, 1, 11, Some(0)).expect("insert");
        repo.insert(&conn, CAR, 1, 12, Some(1)).expect("insert");

        let ordered: Vec<_> = repo
            .rows(&conn, CAR, 1, Direction::From, true)
            .expect("rows")
            .into_iter()
            .map(|row| row.to_id)
            .collect();
        assert_eq!(ordered, vec![11, 12, 10]);

        let by_insertion: Vec<_> = repo
            .rows(&conn, CAR, 1, Direction::From, false)
            .expect("rows")
            .into_iter()
            .map(|row| row.to_id)
            .collect();
        assert_eq!(by_insertion, vec![10, 11, 12]);
    }

    #[test]
    fn max_order_is_none_without_rows() {
        let (conn, repo) = table();
        assert_eq!(repo.max_order(&conn, CAR, 1).expect("max"), None);
        repo.insert(&conn, CAR, 1, 10, Some(4)).expect("insert");
        assert_eq!(repo.max_order(&conn, CAR, 1).expect("max"), Some(4));
    }

    #[test]
    fn delete_pair_and_side_report_counts() {
        let (conn, repo) = table();
        repo.insert(&conn, CAR, 1, 10, None).expect("insert");
        repo.insert(&conn, CAR, 1, 10, None).expect("insert dup");
        repo.insert(&conn, CAR, 2, 10, None).expect("insert");

        assert_eq!(repo.delete_pair(&conn, CAR, 1, 10).expect("delete"), 2);
        assert_eq!(repo.delete_pair(&conn, CAR, 1, 10).expect("delete"), 0);
        assert!(repo.pair_exists(&conn, CAR, 2, 10).expect("exists"));
        assert_eq!(
            repo.delete_side(&conn, CAR, 10, Direction::To).expect("purge"),
            1
        );
        assert!(!repo.pair_exists(&conn, CAR, 2, 10).expect("exists"));
    }
}
