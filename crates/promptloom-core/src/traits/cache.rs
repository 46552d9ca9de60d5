// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt cache trait.

use async_trait::async_trait;

use crate::error::PromptloomError;
use crate::types::CachedPrompt;

/// Cache of previously generated prompts, keyed by source image URL.
///
/// Cache hits remain billable and audited; only the upstream work is skipped.
#[async_trait]
pub trait PromptCache: Send + Sync + 'static {
    /// Looks up a cached prompt for `image_url`.
    async fn get(&self, image_url: &str) -> Result<Option<CachedPrompt>, PromptloomError>;

    /// Stores (or replaces) the cached prompt for `image_url`.
    async fn put(&self, image_url: &str, cached: CachedPrompt) -> Result<(), PromptloomError>;
}
