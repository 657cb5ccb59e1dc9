//! SQLite persistence for Booker.
//!
//! A single [`Database`] wraps one `rusqlite` connection behind a mutex and is
//! shared by the stores through an `Arc`. Each store call runs one statement
//! while holding the lock, so every write commits as its own unit.

use std::path::Path;

use booker_kernel::Migration;
use parking_lot::Mutex;
use rusqlite::{Connection, ErrorCode};
use thiserror::Error;

const MIGRATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS _migrations (
    module TEXT NOT NULL,
    id TEXT NOT NULL,
    applied_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (module, id)
);";

/// Database-related errors
#[derive(Debug, Error)]
pub enum DbError {
    /// SQLite error
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A module migration failed to apply
    #[error("migration {module}/{id} failed: {source}")]
    Migration {
        module: String,
        id: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl DbError {
    /// True when the statement violated a UNIQUE or PRIMARY KEY constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == ErrorCode::ConstraintViolation
                    && matches!(
                        err.extended_code,
                        rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                            | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    )
            }
            _ => false,
        }
    }
}

/// Shared SQLite handle.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at `path`. `:memory:` is accepted.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();
        let conn = if path == Path::new(":memory:") {
            Connection::open_in_memory()?
        } else {
            let conn = Connection::open(path)?;
            // WAL mode for concurrent readers; not available in memory.
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            conn
        };
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(MIGRATIONS_TABLE)?;

        tracing::info!(target: "booker-db", path = %path.display(), "database opened");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new in-memory database (useful for testing)
    pub fn in_memory() -> Result<Self, DbError> {
        Self::open(":memory:")
    }

    /// Run `f` against the connection while holding the lock.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, DbError> {
        let conn = self.conn.lock();
        Ok(f(&conn)?)
    }

    /// Apply every migration not yet recorded in `_migrations`.
    ///
    /// Each migration runs in its own transaction together with its
    /// bookkeeping row. Returns how many were applied.
    pub fn apply_migrations(&self, migrations: &[(String, Migration)]) -> Result<usize, DbError> {
        let mut conn = self.conn.lock();
        let mut applied = 0;

        for (module, migration) in migrations {
            let already: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM _migrations WHERE module = ?1 AND id = ?2)",
                rusqlite::params![module, migration.id],
                |row| row.get(0),
            )?;
            if already {
                tracing::debug!(target: "booker-db", %module, id = migration.id, "migration already applied");
                continue;
            }

            let wrap = |source| DbError::Migration {
                module: module.clone(),
                id: migration.id.to_string(),
                source,
            };

            let tx = conn.transaction().map_err(wrap)?;
            tx.execute_batch(migration.up).map_err(wrap)?;
            tx.execute(
                "INSERT INTO _migrations (module, id) VALUES (?1, ?2)",
                rusqlite::params![module, migration.id],
            )
            .map_err(wrap)?;
            tx.commit().map_err(wrap)?;

            tracing::info!(target: "booker-db", %module, id = migration.id, "migration applied");
            applied += 1;
        }

        Ok(applied)
    }

    /// `(module, id)` of every applied migration, oldest first.
    pub fn applied_migrations(&self) -> Result<Vec<(String, String)>, DbError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT module, id FROM _migrations ORDER BY rowid")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
