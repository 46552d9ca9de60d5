// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rated category exemplar store.

use std::str::FromStr;

use async_trait::async_trait;
use promptloom_core::{CategoryExample, CategoryKey, ExampleSource, ExampleStore, PromptloomError};

use crate::database::{map_tr_err, Database};

/// Exemplar store over the `category_examples` table.
pub struct SqliteExampleStore {
    conn: tokio_rusqlite::Connection,
}

impl SqliteExampleStore {
    pub fn new(db: &Database) -> Self {
        Self {
            conn: db.connection(),
        }
    }

    /// Inserts one exemplar. Seeding helper for the CLI and tests.
    pub async fn add(
        &self,
        category: CategoryKey,
        example: &CategoryExample,
    ) -> Result<(), PromptloomError> {
        let id = uuid::Uuid::new_v4().to_string();
        let category = category.to_string();
        let prompt = example.prompt.clone();
        let rating = example.rating;
        let source = example.source.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO category_examples (id, category, prompt, rating, source) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![id, category, prompt, rating, source],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl ExampleStore for SqliteExampleStore {
    async fn top_examples(
        &self,
        category: CategoryKey,
        limit: usize,
    ) -> Result<Vec<CategoryExample>, PromptloomError> {
        let category = category.to_string();
        let rows = self
            .conn
            .call(
                move |conn| -> Result<Vec<(String, u8, String)>, rusqlite::Error> {
                    let mut stmt = conn.prepare(
                        "SELECT prompt, rating, source FROM category_examples \
                         WHERE category = ?1 ORDER BY rating DESC LIMIT ?2",
                    )?;
                    let rows = stmt.query_map(
                        rusqlite::params![category, limit as i64],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                    )?;
                    rows.collect()
                },
            )
            .await
            .map_err(map_tr_err)?;

        Ok(rows
            .into_iter()
            .map(|(prompt, rating, source)| CategoryExample {
                prompt,
                rating,
                source: ExampleSource::from_str(&source).unwrap_or(ExampleSource::Community),
            })
            .collect())
    }
}
