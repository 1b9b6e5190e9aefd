//! SQLite datastore utilities.
//!
//! Runtime defaults are intentionally conservative:
//! - `journal_mode = WAL` to allow concurrent readers while a writer commits
//! - `busy_timeout = 5s` so competing writers wait instead of failing fast
//! - `synchronous = NORMAL`, which is durable enough under WAL

pub mod repository;
pub mod schema;
pub mod tables;

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::{path::Path, time::Duration};

use crate::error::{RelationError, StorageContext};
use tracing::error;

/// Default busy timeout for datastore connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the relationship database and apply runtime pragmas.
///
/// Join tables are not created here; they are ensured per category when a
/// registry is frozen.
///
/// # Errors
///
/// Returns an error if opening or configuring the database fails.
pub fn open(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create database directory {}", parent.display()))?;
        }
    }

    let conn = Connection::open(path)
        .with_context(|| format!("open relationship database {}", path.display()))?;

    configure_connection(&conn, busy_timeout).context("configure sqlite pragmas")?;

    Ok(conn)
}

fn configure_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}

const NESTED_SAVEPOINT: &str = "tether_write";

/// Run `f` as one atomic unit of work.
///
/// Outside a transaction this opens an immediate transaction, taking the
/// write lock before `f` reads, so checks and the writes that depend on
/// them cannot interleave with another writer. Inside a caller's
/// transaction a savepoint is used instead, and a failure in `f` rolls
/// back only what `f` did.
pub(crate) fn atomically<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T, RelationError>,
) -> Result<T, RelationError> {
    if !conn.is_autocommit() {
        conn.execute_batch(&format!("SAVEPOINT {NESTED_SAVEPOINT}"))
            .storage("open savepoint")?;
        return match f(conn) {
            Ok(value) => {
                conn.execute_batch(&format!("RELEASE {NESTED_SAVEPOINT}"))
                    .storage("release savepoint")?;
                Ok(value)
            }
            Err(err) => {
                if let Err(source) = conn.execute_batch(&format!(
                    "ROLLBACK TO {NESTED_SAVEPOINT}; RELEASE {NESTED_SAVEPOINT}"
                )) {
                    error!(error = %err, rollback_error = %source, "savepoint rollback failed");
                    return Err(RelationError::Storage {
                        context: format!("roll back savepoint after: {err}"),
                        source,
                    });
                }
                Err(err)
            }
        };
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .storage("begin write transaction")?;
    let value = f(&tx)?;
    tx.commit().storage("commit write transaction")?;
    Ok(value)
}
