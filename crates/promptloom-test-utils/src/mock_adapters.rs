// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted mock implementations of the external-service adapter traits.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use promptloom_core::{
    AdapterType, AnalysisResult, Embedder, GenerationInstruction, HealthStatus, PluginAdapter,
    PromptGenerator, PromptloomError, RateDecision, RateLimiter, SimilarityHit, VectorIndex,
    VisionAnalyzer,
};
use tokio::sync::Mutex;

macro_rules! impl_plugin_adapter {
    ($ty:ty, $name:literal, $kind:expr) => {
        #[async_trait]
        impl PluginAdapter for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn version(&self) -> semver::Version {
                semver::Version::new(0, 1, 0)
            }

            fn adapter_type(&self) -> AdapterType {
                $kind
            }

            async fn health_check(&self) -> Result<HealthStatus, PromptloomError> {
                Ok(HealthStatus::Healthy)
            }

            async fn shutdown(&self) -> Result<(), PromptloomError> {
                Ok(())
            }
        }
    };
}

/// Scripted vision analyzer. Queue `Some(analysis)` for a successful
/// analysis, `None` for a degraded one (failure or poll timeout), or a
/// failure message for an outright error.
#[derive(Default)]
pub struct MockVision {
    script: Mutex<VecDeque<Result<Option<AnalysisResult>, String>>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockVision {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, response: Option<AnalysisResult>) {
        self.script.lock().await.push_back(Ok(response));
    }

    pub async fn push_failure(&self, message: &str) {
        self.script.lock().await.push_back(Err(message.to_string()));
    }
}

#[async_trait]
impl VisionAnalyzer for MockVision {
    async fn analyze(&self, image_url: &str) -> Result<Option<AnalysisResult>, PromptloomError> {
        self.calls.lock().await.push(image_url.to_string());
        match self
            .script
            .lock()
            .await
            .pop_front()
            .expect("MockVision script exhausted")
        {
            Ok(response) => Ok(response),
            Err(message) => Err(PromptloomError::upstream("vision", message)),
        }
    }
}

impl_plugin_adapter!(MockVision, "mock-vision", AdapterType::Vision);

/// Scripted embedder. Queue vectors or failures; calls are recorded with
/// the exact input text.
#[derive(Default)]
pub struct MockEmbedder {
    script: Mutex<VecDeque<Result<Vec<f32>, String>>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_vector(&self, vector: Vec<f32>) {
        self.script.lock().await.push_back(Ok(vector));
    }

    pub async fn push_failure(&self, message: &str) {
        self.script.lock().await.push_back(Err(message.to_string()));
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PromptloomError> {
        self.calls.lock().await.push(text.to_string());
        match self
            .script
            .lock()
            .await
            .pop_front()
            .expect("MockEmbedder script exhausted")
        {
            Ok(vector) => Ok(vector),
            Err(message) => Err(PromptloomError::upstream("embedding", message)),
        }
    }
}

impl_plugin_adapter!(MockEmbedder, "mock-embedder", AdapterType::Embedding);

/// Scripted vector index returning queued hit lists.
#[derive(Default)]
pub struct MockIndex {
    script: Mutex<VecDeque<Vec<SimilarityHit>>>,
    pub calls: Mutex<Vec<(usize, bool)>>,
}

impl MockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, hits: Vec<SimilarityHit>) {
        self.script.lock().await.push_back(hits);
    }
}

#[async_trait]
impl VectorIndex for MockIndex {
    async fn query(
        &self,
        _vector: &[f32],
        limit: usize,
        public_only: bool,
    ) -> Result<Vec<SimilarityHit>, PromptloomError> {
        self.calls.lock().await.push((limit, public_only));
        let hits = self
            .script
            .lock()
            .await
            .pop_front()
            .expect("MockIndex script exhausted");
        Ok(hits)
    }
}

impl_plugin_adapter!(MockIndex, "mock-index", AdapterType::Index);

/// Scripted prompt generator. An empty queued string models the soft
/// failure the real client returns.
#[derive(Default)]
pub struct MockGenerator {
    script: Mutex<VecDeque<String>>,
    pub calls: Mutex<Vec<GenerationInstruction>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, prompt: &str) {
        self.script.lock().await.push_back(prompt.to_string());
    }
}

#[async_trait]
impl PromptGenerator for MockGenerator {
    async fn generate(
        &self,
        instruction: &GenerationInstruction,
    ) -> Result<String, PromptloomError> {
        self.calls.lock().await.push(instruction.clone());
        let prompt = self
            .script
            .lock()
            .await
            .pop_front()
            .expect("MockGenerator script exhausted");
        Ok(prompt)
    }
}

impl_plugin_adapter!(MockGenerator, "mock-generator", AdapterType::Generation);

/// Rate limiter that admits everything unless a window is scripted to
/// deny. Records every check in order.
#[derive(Default)]
pub struct MockRateLimiter {
    denials: Mutex<Vec<(String, Duration)>>,
    pub checks: Mutex<Vec<(String, String)>>,
}

impl MockRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Denies all future checks on the named window.
    pub async fn deny(&self, limit: &str, retry_after: Duration) {
        self.denials.lock().await.push((limit.to_string(), retry_after));
    }
}

#[async_trait]
impl RateLimiter for MockRateLimiter {
    async fn check(&self, limit: &str, key: &str) -> Result<RateDecision, PromptloomError> {
        self.checks
            .lock()
            .await
            .push((limit.to_string(), key.to_string()));
        let denials = self.denials.lock().await;
        if let Some((_, retry_after)) = denials.iter().find(|(name, _)| name == limit) {
            return Ok(RateDecision::deny(*retry_after));
        }
        Ok(RateDecision::admit())
    }
}
