// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit sink trait.

use async_trait::async_trait;

use crate::error::PromptloomError;
use crate::types::AuditRecord;

/// Append-only sink for completed generation runs.
#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    /// Appends one record. Never updates or deletes.
    async fn record(&self, record: &AuditRecord) -> Result<(), PromptloomError>;
}
