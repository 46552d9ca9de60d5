// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template store trait.

use async_trait::async_trait;

use crate::error::PromptloomError;
use crate::types::PromptTemplate;

/// Lookup of generation instruction templates by key.
///
/// Keys follow `prompt-{category}` for category-specific templates and
/// `prompt-generic` for the default. Absence of the selected key is a hard
/// configuration failure at the call site, not here.
#[async_trait]
pub trait TemplateStore: Send + Sync + 'static {
    /// Fetches the template stored under `key`, if present.
    async fn get_by_key(&self, key: &str) -> Result<Option<PromptTemplate>, PromptloomError>;
}
