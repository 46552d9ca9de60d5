// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Promptloom prompt-generation pipeline.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Promptloom adapter traits and the
/// pipeline orchestrator.
#[derive(Debug, Error)]
pub enum PromptloomError {
    /// A named rate-limit window rejected the request.
    #[error("rate limited on `{limit}`, retry after {retry_after:?}")]
    RateLimited {
        limit: String,
        retry_after: Duration,
    },

    /// The account's credit balance does not cover the request cost.
    #[error("insufficient credits: {required} required, {available} available")]
    InsufficientCredits { required: u32, available: u32 },

    /// Neither text nor an image reference was supplied.
    #[error("nothing to analyze: no text or image supplied")]
    NoInput,

    /// A required template or API key is not configured.
    #[error("not configured: {0}")]
    ConfigurationMissing(String),

    /// An external service call failed (vision, embedding, index, generation).
    #[error("{service} error: {message}")]
    Upstream {
        service: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No usable prompt could be produced, even after fallbacks.
    #[error("generation produced no usable output")]
    GenerationEmpty,

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PromptloomError {
    /// Convenience constructor for upstream failures without a source error.
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
            source: None,
        }
    }
}
