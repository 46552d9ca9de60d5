// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt cache keyed by source image URL.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use promptloom_core::{CachedPrompt, CategoryKey, PromptCache, PromptloomError};
use tracing::debug;

use crate::database::{map_tr_err, Database};

/// Prompt cache over the `prompt_cache` table. The analysis is stored as a
/// JSON blob alongside the prompt text.
pub struct SqlitePromptCache {
    conn: tokio_rusqlite::Connection,
}

impl SqlitePromptCache {
    pub fn new(db: &Database) -> Self {
        Self {
            conn: db.connection(),
        }
    }
}

#[async_trait]
impl PromptCache for SqlitePromptCache {
    async fn get(&self, image_url: &str) -> Result<Option<CachedPrompt>, PromptloomError> {
        let url = image_url.to_string();
        let row = self
            .conn
            .call(
                move |conn| -> Result<
                    Option<(String, Option<String>, Option<String>, String)>,
                    rusqlite::Error,
                > {
                    use rusqlite::OptionalExtension;
                    conn.query_row(
                        "SELECT prompt, analysis, category, created_at FROM prompt_cache \
                         WHERE image_url = ?1",
                        rusqlite::params![url],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                    )
                    .optional()
                },
            )
            .await
            .map_err(map_tr_err)?;

        let Some((prompt, analysis, category, created_at)) = row else {
            return Ok(None);
        };

        let analysis = analysis.and_then(|raw| serde_json::from_str(&raw).ok());
        let category = category.and_then(|raw| CategoryKey::from_str(&raw).ok());
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| PromptloomError::Internal(format!("bad cache timestamp: {e}")))?;

        debug!(image_url, "prompt cache hit");
        Ok(Some(CachedPrompt {
            prompt,
            analysis,
            category,
            created_at,
        }))
    }

    async fn put(&self, image_url: &str, cached: CachedPrompt) -> Result<(), PromptloomError> {
        let url = image_url.to_string();
        let prompt = cached.prompt;
        let analysis = cached
            .analysis
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| PromptloomError::Internal(format!("analysis serialization: {e}")))?;
        let category = cached.category.map(|c| c.to_string());
        let created_at = cached.created_at.to_rfc3339();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO prompt_cache (image_url, prompt, analysis, category, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5) \
                     ON CONFLICT(image_url) DO UPDATE SET \
                     prompt = ?2, analysis = ?3, category = ?4, created_at = ?5",
                    rusqlite::params![url, prompt, analysis, category, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}
