// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! Every query runs as one closure on tokio-rusqlite's single background
//! thread, so closures never interleave. The operations that must be atomic
//! are each one closure:
//!
//! - ticket creation: counter upsert and ticket insert in one transaction
//! - ticket save: `UPDATE ... WHERE version = ?`
//! - advisor bind: `UPDATE ... WHERE status = 'AVAILABLE'`
//! - advisor release: floored decrement with Busy/Available re-derivation
//! - notification scheduling: insert guarded by a partial unique index
//! - delivery bookkeeping: `UPDATE ... WHERE status = 'PENDING'`
//!
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use tracing::debug;
use wicket_core::WicketError;

use crate::migrations;

const CONNECTION_PRAGMAS: &str = "
    PRAGMA foreign_keys = ON;
    PRAGMA busy_timeout = 5000;
    PRAGMA synchronous = NORMAL;
";

/// Convert a tokio-rusqlite error into `WicketError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> WicketError {
    WicketError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the SQLite database. Cloning shares the single writer thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` in WAL mode and
    /// applies pending migrations.
    pub async fn open(path: &str) -> Result<Self, WicketError> {
        Self::open_with(path, true).await
    }

    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, WicketError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| WicketError::Storage {
                source: Box::new(e),
            })?;
        }

        // Migrations run on a short-lived synchronous connection before the
        // writer thread starts, so schema changes never interleave with queries.
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), WicketError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(|e| WicketError::Storage {
                    source: Box::new(e),
                })?;
            let journal = if wal_mode { "WAL" } else { "DELETE" };
            conn.pragma_update_and_check(None, "journal_mode", journal, |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| WicketError::Storage {
                source: Box::new(e),
            })?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| WicketError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| WicketError::Storage {
                source: Box::new(e),
            })?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(CONNECTION_PRAGMAS)
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The single writer connection. Query modules call through it.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL and stops the writer thread.
    pub async fn close(&self) -> Result<(), WicketError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        self.conn
            .clone()
            .close()
            .await
            .map_err(|e| WicketError::Storage {
                source: Box::new(e),
            })?;
        debug!("database closed");
        Ok(())
    }
}
