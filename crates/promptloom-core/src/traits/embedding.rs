// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::PromptloomError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for converting text into a fixed-dimensionality vector.
///
/// Implementations must return vectors of exactly
/// [`EMBEDDING_DIMENSIONS`](crate::types::EMBEDDING_DIMENSIONS) elements.
#[async_trait]
pub trait Embedder: PluginAdapter {
    /// Generates an embedding for the given text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PromptloomError>;
}
