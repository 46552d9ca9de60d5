// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only audit log of completed generation runs.

use async_trait::async_trait;
use promptloom_core::{AuditRecord, AuditSink, PromptloomError};
use tracing::info;

use crate::database::{map_tr_err, Database};

/// Audit sink over the `generation_audit` table. Insert-only; nothing in
/// the crate updates or deletes rows.
pub struct SqliteAuditSink {
    conn: tokio_rusqlite::Connection,
}

impl SqliteAuditSink {
    pub fn new(db: &Database) -> Self {
        Self {
            conn: db.connection(),
        }
    }

    /// Number of audit rows, optionally filtered by account.
    pub async fn count(&self, account_id: Option<&str>) -> Result<u64, PromptloomError> {
        let account = account_id.map(str::to_string);
        self.conn
            .call(move |conn| -> Result<u64, rusqlite::Error> {
                match account {
                    Some(account) => conn.query_row(
                        "SELECT COUNT(*) FROM generation_audit WHERE account_id = ?1",
                        rusqlite::params![account],
                        |row| row.get(0),
                    ),
                    None => conn.query_row(
                        "SELECT COUNT(*) FROM generation_audit",
                        [],
                        |row| row.get(0),
                    ),
                }
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), PromptloomError> {
        let id = record.id.clone();
        let account_id = record.account_id.clone();
        let request_text = record.request_text.clone();
        let request_image_url = record.request_image_url.clone();
        let prompt = record.prompt.clone();
        let category = record.category.map(|c| c.to_string());
        let credits_used = record.credits_used;
        let cached = record.cached;
        let created_at = record.created_at.to_rfc3339();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO generation_audit (id, account_id, request_text, \
                     request_image_url, prompt, category, credits_used, cached, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    rusqlite::params![
                        id,
                        account_id,
                        request_text,
                        request_image_url,
                        prompt,
                        category,
                        credits_used,
                        cached,
                        created_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        info!(
            id = %record.id,
            account_id = record.account_id.as_deref().unwrap_or("guest"),
            credits_used = record.credits_used,
            cached = record.cached,
            "generation audited"
        );
        Ok(())
    }
}
