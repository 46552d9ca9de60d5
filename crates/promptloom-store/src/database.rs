// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite database handle and schema migration.
//!
//! One connection serves every store; all access goes through the single
//! tokio-rusqlite background thread.

use promptloom_core::PromptloomError;
use tracing::info;

/// Full schema, applied idempotently on open.
const MIGRATION: &str = "
CREATE TABLE IF NOT EXISTS credit_accounts (
    account_id TEXT PRIMARY KEY NOT NULL,
    balance INTEGER NOT NULL DEFAULT 0,
    tier TEXT NOT NULL DEFAULT 'free',
    entitlement_expires_at TEXT
);

CREATE TABLE IF NOT EXISTS generation_audit (
    id TEXT PRIMARY KEY NOT NULL,
    account_id TEXT,
    request_text TEXT,
    request_image_url TEXT,
    prompt TEXT NOT NULL,
    category TEXT,
    credits_used INTEGER NOT NULL DEFAULT 0,
    cached INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_generation_audit_account ON generation_audit(account_id);
CREATE INDEX IF NOT EXISTS idx_generation_audit_created ON generation_audit(created_at);

CREATE TABLE IF NOT EXISTS prompt_cache (
    image_url TEXT PRIMARY KEY NOT NULL,
    prompt TEXT NOT NULL,
    analysis TEXT,
    category TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS category_examples (
    id TEXT PRIMARY KEY NOT NULL,
    category TEXT NOT NULL,
    prompt TEXT NOT NULL,
    rating INTEGER NOT NULL DEFAULT 0,
    source TEXT NOT NULL DEFAULT 'community'
);
CREATE INDEX IF NOT EXISTS idx_category_examples_category
    ON category_examples(category, rating DESC);

CREATE TABLE IF NOT EXISTS corpus_images (
    id TEXT PRIMARY KEY NOT NULL,
    image_url TEXT NOT NULL,
    prompt TEXT,
    embedding TEXT NOT NULL,
    aesthetic_score REAL,
    curated INTEGER,
    public INTEGER NOT NULL DEFAULT 1
);
";

/// Convert a tokio-rusqlite error into PromptloomError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> PromptloomError {
    PromptloomError::Storage {
        source: Box::new(e),
    }
}

/// Shared SQLite database handle.
///
/// Cheap to clone; clones share the same background connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if necessary) the database at `path` and applies the
    /// schema migration.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, PromptloomError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| PromptloomError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.migrate(wal_mode).await?;
        info!(path, "database opened");
        Ok(db)
    }

    /// Opens an in-memory database with the schema applied. For tests.
    pub async fn open_in_memory() -> Result<Self, PromptloomError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| PromptloomError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.migrate(false).await?;
        Ok(db)
    }

    async fn migrate(&self, wal_mode: bool) -> Result<(), PromptloomError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                }
                conn.execute_batch(MIGRATION)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> tokio_rusqlite::Connection {
        self.conn.clone()
    }

    /// Runs a trivial query to verify the connection is alive.
    pub async fn ping(&self) -> Result<(), PromptloomError> {
        self.conn
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT 1", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)?;
        Ok(())
    }
}
