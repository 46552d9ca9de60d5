// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembly of the production pipeline from configuration.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use promptloom_config::PromptloomConfig;
use promptloom_core::{
    AdapterType, AnalysisResult, HealthStatus, PluginAdapter, PromptloomError, VisionAnalyzer,
};
use promptloom_embedding::EmbeddingClient;
use promptloom_generate::{BuiltinTemplates, CompletionClient};
use promptloom_pipeline::{
    FixedWindowLimiter, InMemoryProgressStore, Pipeline, PipelineSettings, RateWindows,
};
use promptloom_store::{
    Database, SqliteAuditSink, SqliteCreditLedger, SqliteExampleStore, SqlitePromptCache,
    SqliteVectorIndex,
};
use promptloom_vision::VisionClient;
use tracing::warn;

/// Stand-in vision adapter used when no vision service is configured.
/// Every analysis degrades to none, so image-only requests fail at the
/// embedding stage and text requests run without image context.
pub struct UnconfiguredVision;

#[async_trait]
impl PluginAdapter for UnconfiguredVision {
    fn name(&self) -> &str {
        "vision-unconfigured"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Vision
    }

    async fn health_check(&self) -> Result<HealthStatus, PromptloomError> {
        Ok(HealthStatus::Degraded("vision.base_url not set".into()))
    }

    async fn shutdown(&self) -> Result<(), PromptloomError> {
        Ok(())
    }
}

#[async_trait]
impl VisionAnalyzer for UnconfiguredVision {
    async fn analyze(&self, image_url: &str) -> Result<Option<AnalysisResult>, PromptloomError> {
        warn!(image_url, "vision service not configured, skipping analysis");
        Ok(None)
    }
}

/// Maps the four window sizes out of configuration.
pub fn rate_windows(config: &PromptloomConfig) -> RateWindows {
    RateWindows::new(
        config.limits.guest_per_minute,
        config.limits.guest_per_hour,
        config.limits.user_per_minute,
        config.limits.user_per_hour,
    )
}

/// Builds the full production pipeline: SQLite-backed stores, HTTP adapters,
/// the in-process limiter and progress store, and built-in templates.
pub async fn build_pipeline(config: &PromptloomConfig) -> Result<Pipeline, PromptloomError> {
    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;

    let vision: Arc<dyn VisionAnalyzer> = match &config.vision.base_url {
        Some(base_url) => Arc::new(VisionClient::new(
            base_url.clone(),
            config.vision.api_key.clone(),
            Duration::from_secs(config.vision.poll_interval_secs),
            config.vision.max_poll_attempts,
            Duration::from_secs(config.vision.request_timeout_secs),
        )?),
        None => Arc::new(UnconfiguredVision),
    };

    let embedder = EmbeddingClient::new(
        config.embedding.base_url.clone(),
        config.embedding.api_key.clone(),
        config.embedding.model.clone(),
        config.embedding.max_input_chars,
    )?;
    let generator = CompletionClient::new(
        config.generation.base_url.clone(),
        config.generation.api_key.clone(),
        config.generation.model.clone(),
        Duration::from_secs(config.generation.request_timeout_secs),
    )?;

    let windows = rate_windows(config);
    Ok(Pipeline {
        vision,
        embedder: Arc::new(embedder),
        index: Arc::new(SqliteVectorIndex::new(&db)),
        generator: Arc::new(generator),
        limiter: Arc::new(FixedWindowLimiter::new(&windows)),
        progress: Arc::new(InMemoryProgressStore::new()),
        templates: Arc::new(BuiltinTemplates),
        examples: Arc::new(SqliteExampleStore::new(&db)),
        ledger: Arc::new(SqliteCreditLedger::new(&db)),
        cache: Arc::new(SqlitePromptCache::new(&db)),
        audit: Arc::new(SqliteAuditSink::new(&db)),
        windows,
        settings: PipelineSettings {
            candidate_limit: config.search.candidate_limit,
            max_recommendations: config.search.max_recommendations,
            relevance_threshold: config.search.relevance_threshold,
            max_examples: config.search.max_examples,
            max_images: config.search.max_images,
            base_cost: config.credits.base_cost,
            cached_cost: config.credits.cached_cost,
        },
    })
}
