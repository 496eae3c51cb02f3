// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Query modules accept `&Database` and go through
//! [`Database::connection`]; do NOT open additional connections for writes.

use fedlink_core::FedlinkError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Milliseconds SQLite waits on a locked database before returning `SQLITE_BUSY`.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Handle to the migrated SQLite database.
///
/// Cloning is cheap; every clone talks to the same background thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode and run migrations.
    pub async fn open(path: &str) -> Result<Self, FedlinkError> {
        Self::open_with_options(path, true).await
    }

    /// Open the database at `path`, choosing the journal mode explicitly.
    pub async fn open_with_options(path: &str, wal_mode: bool) -> Result<Self, FedlinkError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| FedlinkError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| FedlinkError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database. Used by tests and dry runs.
    pub async fn open_in_memory() -> Result<Self, FedlinkError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| FedlinkError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    /// The serialized connection all queries go through.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Flush the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), FedlinkError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), FedlinkError> {
        let journal = if wal_mode { "WAL" } else { "DELETE" };
        let pragmas = format!(
            "PRAGMA journal_mode = {journal};
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"
        );
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(&pragmas)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        let applied = self
            .conn
            .call(|conn| -> Result<usize, FedlinkError> { run_migrations(conn) })
            .await
            .map_err(|e| FedlinkError::Storage {
                source: e.to_string().into(),
            })?;
        if applied > 0 {
            debug!(applied, "migrations applied");
        }
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into the crate-wide storage error.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> FedlinkError {
    FedlinkError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/state/fedlink.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());
        db.checkpoint().await.unwrap();
    }

    #[tokio::test]
    async fn open_enables_wal_and_foreign_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pragmas.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let (journal, fk): (String, i64) = db
            .connection()
            .call(|conn| -> Result<(String, i64), rusqlite::Error> {
                let journal = conn.query_row("PRAGMA journal_mode", [], |r| r.get(0))?;
                let fk = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0))?;
                Ok((journal, fk))
            })
            .await
            .unwrap();
        assert_eq!(journal.to_lowercase(), "wal");
        assert_eq!(fk, 1);
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopen.db");
        let path = path.to_str().unwrap();
        drop(Database::open(path).await.unwrap());
        Database::open(path).await.unwrap();
    }
}
