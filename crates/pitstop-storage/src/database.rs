// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! `Database` wraps that one connection; query modules take `&Database` and go
//! through [`Database::connection`]. Do NOT create additional Connection
//! instances for writes.

use std::path::Path;
use std::time::Duration;

use pitstop_core::PitstopError;
use tracing::{debug, info};

use crate::migrations;

/// Handle to the survey database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode and run migrations.
    pub async fn open(path: &str) -> Result<Self, PitstopError> {
        Self::open_with(path, true).await
    }

    /// Open the database, choosing the journal mode explicitly.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, PitstopError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PitstopError::Storage {
                    source: Box::new(e),
                })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| PitstopError::Storage {
                source: format!("failed to open {path}: {e}").into(),
            })?;

        conn.call(move |conn| -> Result<(), PitstopError> {
            configure(conn, wal_mode)?;
            migrations::run_migrations(conn)
        })
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(inner) => inner,
            other => PitstopError::Storage {
                source: other.to_string().into(),
            },
        })?;

        info!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The single serialized connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), PitstopError> {
        checkpoint(&self).await?;
        self.conn.close().await.map_err(|e| PitstopError::Storage {
            source: e.to_string().into(),
        })?;
        debug!("database closed");
        Ok(())
    }
}

/// Truncating WAL checkpoint.
pub async fn checkpoint(db: &Database) -> Result<(), PitstopError> {
    db.connection()
        .call(|conn| {
            conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

fn configure(conn: &mut rusqlite::Connection, wal_mode: bool) -> Result<(), PitstopError> {
    let storage = |e: rusqlite::Error| PitstopError::Storage {
        source: Box::new(e),
    };

    if wal_mode {
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(storage)?;
        debug!(mode, "journal mode set");
    }
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(storage)?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(storage)?;
    conn.busy_timeout(Duration::from_secs(5)).map_err(storage)?;
    Ok(())
}

/// Converts a tokio-rusqlite call error into [`PitstopError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> PitstopError {
    match e {
        tokio_rusqlite::Error::Error(inner) => PitstopError::Storage {
            source: Box::new(inner),
        },
        other => PitstopError::Storage {
            source: other.to_string().into(),
        },
    }
}
