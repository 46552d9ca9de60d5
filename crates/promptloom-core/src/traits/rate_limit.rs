// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate limiter trait.

use async_trait::async_trait;

use crate::error::PromptloomError;
use crate::types::RateDecision;

/// Checks named rate-limit windows before any request side effects.
///
/// A `check` that admits the request also counts it against the window.
#[async_trait]
pub trait RateLimiter: Send + Sync + 'static {
    /// Evaluates the window named `limit` for the given caller key.
    async fn check(&self, limit: &str, key: &str) -> Result<RateDecision, PromptloomError>;
}
