// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Promptloom pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Promptloom configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PromptloomConfig {
    /// Rate-limit window sizes.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Credit pricing settings.
    #[serde(default)]
    pub credits: CreditsConfig,

    /// Vision analysis service settings.
    #[serde(default)]
    pub vision: VisionConfig,

    /// Text embedding service settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Prompt generation (completion) service settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Similarity search and ranking settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Pipeline runtime settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Rate-limit window sizes, requests per window.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Guest requests allowed per minute.
    #[serde(default = "default_guest_per_minute")]
    pub guest_per_minute: u32,

    /// Guest requests allowed per hour.
    #[serde(default = "default_guest_per_hour")]
    pub guest_per_hour: u32,

    /// Authenticated requests allowed per minute.
    #[serde(default = "default_user_per_minute")]
    pub user_per_minute: u32,

    /// Authenticated requests allowed per hour.
    #[serde(default = "default_user_per_hour")]
    pub user_per_hour: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            guest_per_minute: default_guest_per_minute(),
            guest_per_hour: default_guest_per_hour(),
            user_per_minute: default_user_per_minute(),
            user_per_hour: default_user_per_hour(),
        }
    }
}

fn default_guest_per_minute() -> u32 {
    1
}

fn default_guest_per_hour() -> u32 {
    10
}

fn default_user_per_minute() -> u32 {
    5
}

fn default_user_per_hour() -> u32 {
    60
}

/// Credit pricing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreditsConfig {
    /// Flat cost charged for every generation.
    #[serde(default = "default_base_cost")]
    pub base_cost: u32,

    /// Cost charged for a cache hit.
    #[serde(default = "default_cached_cost")]
    pub cached_cost: u32,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            base_cost: default_base_cost(),
            cached_cost: default_cached_cost(),
        }
    }
}

fn default_base_cost() -> u32 {
    1
}

fn default_cached_cost() -> u32 {
    1
}

/// Vision analysis service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VisionConfig {
    /// Base URL of the vision analysis service.
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key for the vision service. `None` requires environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Seconds between result polls for asynchronous analyses.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maximum number of result polls before giving up.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            poll_interval_secs: default_poll_interval_secs(),
            max_poll_attempts: default_max_poll_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_max_poll_attempts() -> u32 {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Text embedding service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding API.
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// API key for the embedding service.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Embedding model identifier.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Expected embedding dimensionality.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Input text is truncated to this many characters before embedding.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_base_url(),
            api_key: None,
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

fn default_embedding_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}

fn default_dimensions() -> usize {
    768
}

fn default_max_input_chars() -> usize {
    2000
}

/// Prompt generation (completion) service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Base URL of the completion API.
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,

    /// API key for the completion service.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Completion model identifier.
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_generation_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_generation_base_url(),
            api_key: None,
            model: default_generation_model(),
            request_timeout_secs: default_generation_timeout_secs(),
        }
    }
}

fn default_generation_base_url() -> String {
    "https://api.straico.com/v1".to_string()
}

fn default_generation_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_generation_timeout_secs() -> u64 {
    60
}

/// Similarity search and ranking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Number of raw candidates fetched from the index before ranking.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,

    /// Maximum ranked hits returned as recommendations.
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,

    /// Minimum raw similarity for the best hit to count as a top match.
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,

    /// Maximum category exemplars included in the generation context.
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,

    /// Maximum reference images processed per request.
    #[serde(default = "default_max_images")]
    pub max_images: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            candidate_limit: default_candidate_limit(),
            max_recommendations: default_max_recommendations(),
            relevance_threshold: default_relevance_threshold(),
            max_examples: default_max_examples(),
            max_images: default_max_images(),
        }
    }
}

fn default_candidate_limit() -> usize {
    20
}

fn default_max_recommendations() -> usize {
    5
}

fn default_relevance_threshold() -> f32 {
    0.5
}

fn default_max_examples() -> usize {
    3
}

fn default_max_images() -> usize {
    5
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "promptloom.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Pipeline runtime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
