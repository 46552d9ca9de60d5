// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Brute-force cosine similarity index over the stored corpus.
//!
//! Embeddings are stored as JSON arrays in the `corpus_images` table and
//! scanned in full per query. At corpus sizes where this becomes a
//! bottleneck the scan can move behind the same trait without touching
//! callers.

use async_trait::async_trait;
use promptloom_core::{
    AdapterType, HealthStatus, PluginAdapter, PromptloomError, SimilarityHit, VectorIndex,
};
use tracing::debug;

use crate::database::{map_tr_err, Database};

/// One corpus entry, as inserted by seeding.
#[derive(Debug, Clone)]
pub struct CorpusImage {
    pub id: String,
    pub image_url: String,
    pub prompt: Option<String>,
    pub embedding: Vec<f32>,
    pub aesthetic_score: Option<f32>,
    pub curated: Option<bool>,
    pub public: bool,
}

/// Cosine similarity between two vectors; 0.0 when either has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Vector index over the `corpus_images` table.
pub struct SqliteVectorIndex {
    conn: tokio_rusqlite::Connection,
}

impl SqliteVectorIndex {
    pub fn new(db: &Database) -> Self {
        Self {
            conn: db.connection(),
        }
    }

    /// Inserts one corpus image. Seeding helper for the CLI and tests.
    pub async fn add(&self, image: &CorpusImage) -> Result<(), PromptloomError> {
        let id = image.id.clone();
        let image_url = image.image_url.clone();
        let prompt = image.prompt.clone();
        let embedding = serde_json::to_string(&image.embedding)
            .map_err(|e| PromptloomError::Internal(format!("embedding serialization: {e}")))?;
        let aesthetic = image.aesthetic_score;
        let curated = image.curated;
        let public = image.public;

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO corpus_images \
                     (id, image_url, prompt, embedding, aesthetic_score, curated, public) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![id, image_url, prompt, embedding, aesthetic, curated, public],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

type CorpusRow = (
    String,
    String,
    Option<String>,
    String,
    Option<f32>,
    Option<bool>,
);

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    async fn query(
        &self,
        vector: &[f32],
        limit: usize,
        public_only: bool,
    ) -> Result<Vec<SimilarityHit>, PromptloomError> {
        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<CorpusRow>, rusqlite::Error> {
                let sql = if public_only {
                    "SELECT id, image_url, prompt, embedding, aesthetic_score, curated \
                     FROM corpus_images WHERE public = 1"
                } else {
                    "SELECT id, image_url, prompt, embedding, aesthetic_score, curated \
                     FROM corpus_images"
                };
                let mut stmt = conn.prepare(sql)?;
                let rows = stmt.query_map([], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                })?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)?;

        let mut hits: Vec<SimilarityHit> = rows
            .into_iter()
            .filter_map(|(id, image_url, prompt, embedding, aesthetic, curated)| {
                let stored: Vec<f32> = serde_json::from_str(&embedding).ok()?;
                Some(SimilarityHit {
                    image_id: id,
                    image_url,
                    prompt,
                    similarity: cosine_similarity(vector, &stored),
                    aesthetic_score: aesthetic,
                    curated,
                    weight: 0.0,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);

        debug!(hits = hits.len(), public_only, "corpus scanned");
        Ok(hits)
    }
}

#[async_trait]
impl PluginAdapter for SqliteVectorIndex {
    fn name(&self) -> &str {
        "index-sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Index
    }

    async fn health_check(&self) -> Result<HealthStatus, PromptloomError> {
        let result = self
            .conn
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM corpus_images", [], |row| row.get(0))
            })
            .await;
        match result {
            Ok(count) if count > 0 => Ok(HealthStatus::Healthy),
            Ok(_) => Ok(HealthStatus::Degraded("corpus is empty".to_string())),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), PromptloomError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_vec(dim: usize, hot: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[hot] = 1.0;
        v
    }

    fn image(id: &str, embedding: Vec<f32>, public: bool) -> CorpusImage {
        CorpusImage {
            id: id.to_string(),
            image_url: format!("https://img/{id}.jpg"),
            prompt: Some(format!("prompt {id}")),
            embedding,
            aesthetic_score: Some(6.0),
            curated: Some(false),
            public,
        }
    }

    #[test]
    fn cosine_basics() {
        let a = [1.0, 0.0];
        let b = [1.0, 0.0];
        let c = [0.0, 1.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &c).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn query_returns_similarity_descending() {
        let db = Database::open_in_memory().await.unwrap();
        let index = SqliteVectorIndex::new(&db);

        index.add(&image("exact", unit_vec(4, 0), true)).await.unwrap();
        index
            .add(&image("partial", vec![0.7, 0.7, 0.0, 0.0], true))
            .await
            .unwrap();
        index
            .add(&image("orthogonal", unit_vec(4, 3), true))
            .await
            .unwrap();

        let hits = index.query(&unit_vec(4, 0), 10, true).await.unwrap();
        assert_eq!(hits[0].image_id, "exact");
        assert_eq!(hits[1].image_id, "partial");
        for pair in hits.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[tokio::test]
    async fn public_only_excludes_private_entries() {
        let db = Database::open_in_memory().await.unwrap();
        let index = SqliteVectorIndex::new(&db);

        index.add(&image("pub", unit_vec(4, 0), true)).await.unwrap();
        index.add(&image("priv", unit_vec(4, 0), false)).await.unwrap();

        let hits = index.query(&unit_vec(4, 0), 10, true).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].image_id, "pub");

        let all = index.query(&unit_vec(4, 0), 10, false).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn limit_truncates_results() {
        let db = Database::open_in_memory().await.unwrap();
        let index = SqliteVectorIndex::new(&db);

        for i in 0..5 {
            index
                .add(&image(&format!("img{i}"), unit_vec(4, i % 4), true))
                .await
                .unwrap();
        }
        let hits = index.query(&unit_vec(4, 0), 2, true).await.unwrap();
        assert_eq!(hits.len(), 2);
    }
}
