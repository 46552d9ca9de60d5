// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vision analysis adapter trait.

use async_trait::async_trait;

use crate::error::PromptloomError;
use crate::traits::adapter::PluginAdapter;
use crate::types::AnalysisResult;

/// Adapter for structured visual analysis of a reference image.
///
/// Analysis is best-effort by contract: `Ok(None)` means the upstream could
/// not produce a result (failure, malformed payload, or poll timeout) and the
/// pipeline degrades rather than aborting. `Err` is reserved for conditions
/// the caller must surface, such as missing configuration.
#[async_trait]
pub trait VisionAnalyzer: PluginAdapter {
    /// Analyzes the image at `image_url`, polling if the service responds
    /// asynchronously. Returns `None` when no usable analysis was obtained.
    async fn analyze(&self, image_url: &str) -> Result<Option<AnalysisResult>, PromptloomError>;
}
