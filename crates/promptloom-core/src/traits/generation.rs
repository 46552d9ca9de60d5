// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt generation (completion) adapter trait.

use async_trait::async_trait;

use crate::error::PromptloomError;
use crate::traits::adapter::PluginAdapter;
use crate::types::GenerationInstruction;

/// Adapter for the LLM completion call that produces the final prompt.
///
/// An empty returned string is a soft failure: the orchestrator applies its
/// fallback chain instead of aborting the run.
#[async_trait]
pub trait PromptGenerator: PluginAdapter {
    /// Generates a prompt from the assembled instruction. Returns an empty
    /// string when the upstream produced nothing usable.
    async fn generate(&self, instruction: &GenerationInstruction)
        -> Result<String, PromptloomError>;
}
