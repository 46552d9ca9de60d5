// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait implemented by every external-service adapter.

use async_trait::async_trait;

use crate::error::PromptloomError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all Promptloom service adapters.
///
/// Every adapter backed by an external service (vision, embedding, index,
/// generation) implements this trait, which provides identity, lifecycle,
/// and health check capabilities surfaced by the `doctor` command.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the type of adapter (vision, embedding, index, generation).
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, PromptloomError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), PromptloomError>;
}
