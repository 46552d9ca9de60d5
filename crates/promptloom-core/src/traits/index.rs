// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector similarity index trait.

use async_trait::async_trait;

use crate::error::PromptloomError;
use crate::traits::adapter::PluginAdapter;
use crate::types::SimilarityHit;

/// Adapter over the corpus similarity index.
///
/// Returned hits carry raw cosine similarity; their `weight` field is left at
/// 0.0 for the ranker to fill in.
#[async_trait]
pub trait VectorIndex: PluginAdapter {
    /// Finds up to `limit` nearest corpus images to `vector`, similarity
    /// descending. With `public_only`, private corpus entries are excluded.
    async fn query(
        &self,
        vector: &[f32],
        limit: usize,
        public_only: bool,
    ) -> Result<Vec<SimilarityHit>, PromptloomError>;
}
