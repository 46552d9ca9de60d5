// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Progress store trait.

use async_trait::async_trait;

use crate::error::PromptloomError;
use crate::types::ProgressRecord;

/// Keyed store of live pipeline progress, read by polling UIs.
///
/// At most one record per identity. Writes overwrite in place with no
/// locking; concurrent runs under one identity are last-writer-wins.
#[async_trait]
pub trait ProgressStore: Send + Sync + 'static {
    /// Writes or overwrites the record for its identity.
    async fn upsert(&self, record: ProgressRecord) -> Result<(), PromptloomError>;

    /// Reads the current record for `identity`, if any.
    async fn get(&self, identity: &str) -> Result<Option<ProgressRecord>, PromptloomError>;

    /// Removes the record for `identity`. A no-op when absent.
    async fn clear(&self, identity: &str) -> Result<(), PromptloomError>;
}
