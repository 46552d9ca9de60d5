// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Category exemplar store trait.

use async_trait::async_trait;

use crate::error::PromptloomError;
use crate::types::{CategoryExample, CategoryKey};

/// Read-only store of rated example prompts per style category.
#[async_trait]
pub trait ExampleStore: Send + Sync + 'static {
    /// Returns up to `limit` examples for `category`, rating descending.
    async fn top_examples(
        &self,
        category: CategoryKey,
        limit: usize,
    ) -> Result<Vec<CategoryExample>, PromptloomError>;
}
