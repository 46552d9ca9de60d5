// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across adapter traits and the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{Display, EnumString};

/// Whether a request comes from an anonymous caller or a signed-in account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestOrigin {
    Guest,
    Authenticated,
}

/// A single prompt-generation request. Immutable once accepted; identifies
/// exactly one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Free text supplied by the caller.
    pub text: Option<String>,
    /// Reference image URLs. The pipeline processes at most
    /// [`MAX_IMAGES_PER_REQUEST`] of these, sequentially.
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Explicit style category. Always takes priority over detection.
    pub category: Option<CategoryKey>,
    pub origin: RequestOrigin,
    /// Rate-limit key: IP-derived for guests, account id for authenticated.
    pub rate_limit_key: String,
    pub account_id: Option<String>,
    /// Per-session progress identity. When absent, no progress is reported.
    pub progress_identity: Option<String>,
}

/// Upper bound on reference images handled per request.
pub const MAX_IMAGES_PER_REQUEST: usize = 5;

/// Fixed dimensionality of the embedding space.
pub const EMBEDDING_DIMENSIONS: usize = 768;

impl GenerationRequest {
    /// Returns the trimmed caller text, if any non-blank text was supplied.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// True when the request carries neither text nor an image reference.
    pub fn is_empty(&self) -> bool {
        self.trimmed_text().is_none() && self.image_urls.is_empty()
    }

    /// Number of images the pipeline will actually process.
    pub fn image_count(&self) -> usize {
        self.image_urls.len().min(MAX_IMAGES_PER_REQUEST)
    }
}

/// Pipeline stage reported through the progress store. Forward-only except
/// `Error`, which is reachable from any stage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStep {
    Initializing,
    Analyzing,
    Embedding,
    Searching,
    Generating,
    Complete,
    Error,
}

/// Minimal hit description surfaced to a polling UI while the run is live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarPreview {
    pub image_id: String,
    pub image_url: String,
}

/// Keyed progress record, overwritten in place per request. At most one live
/// record per identity; last writer wins by design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub identity: String,
    pub step: ProgressStep,
    pub detail: String,
    pub similar_count: Option<usize>,
    #[serde(default)]
    pub similar_preview: Vec<SimilarPreview>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Creates a fresh record at the given step, timestamped now.
    pub fn new(identity: impl Into<String>, step: ProgressStep, detail: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            identity: identity.into(),
            step,
            detail: detail.into(),
            similar_count: None,
            similar_preview: Vec::new(),
            started_at: now,
            updated_at: now,
        }
    }
}

/// Normalized form of the vision service's raw response. Mood and lighting
/// are always flat strings here, whatever shape the upstream returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub short_description: Option<String>,
    pub mood: Option<String>,
    pub lighting: Option<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AnalysisResult {
    /// True when the analysis carries no usable signal at all.
    pub fn is_empty(&self) -> bool {
        self.short_description.is_none()
            && self.mood.is_none()
            && self.lighting.is_none()
            && self.colors.is_empty()
            && self.tags.is_empty()
    }
}

/// One result from the similarity index, with its derived ranking weight.
///
/// `weight` is 0.0 on raw index hits; the ranker fills it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityHit {
    pub image_id: String,
    pub image_url: String,
    pub prompt: Option<String>,
    pub similarity: f32,
    pub aesthetic_score: Option<f32>,
    pub curated: Option<bool>,
    #[serde(default)]
    pub weight: f32,
}

impl SimilarityHit {
    pub fn preview(&self) -> SimilarPreview {
        SimilarPreview {
            image_id: self.image_id.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

/// Style categories, in detection priority order (first match wins).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CategoryKey {
    YoutubeThumbnail,
    Anime,
    Logo,
    Product,
    Abstract,
    Cinematic,
    Illustration,
    Realistic,
}

impl Default for CategoryKey {
    fn default() -> Self {
        CategoryKey::Realistic
    }
}

/// Where a category exemplar came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExampleSource {
    Curated,
    Community,
    Generated,
}

/// A stored, rated example prompt used as in-context guidance for a category.
/// Read-only input to generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryExample {
    pub prompt: String,
    /// Quality rating on a 0-100 scale.
    pub rating: u8,
    pub source: ExampleSource,
}

/// Terminal success result of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub prompt: String,
    pub top_match: Option<SimilarityHit>,
    #[serde(default)]
    pub recommendations: Vec<SimilarityHit>,
    pub analysis: Option<AnalysisResult>,
    pub category: Option<CategoryKey>,
    pub credits_used: u32,
    pub cached: bool,
}

/// Append-only audit form of a completed run: input, output, attribution, cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record identifier (UUID v4).
    pub id: String,
    pub account_id: Option<String>,
    pub request_text: Option<String>,
    pub request_image_url: Option<String>,
    pub prompt: String,
    pub category: Option<CategoryKey>,
    pub credits_used: u32,
    pub cached: bool,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Builds an audit record from a request and its outcome, timestamped now.
    pub fn from_outcome(request: &GenerationRequest, outcome: &GenerationOutcome) -> Self {
        Self {
            id: new_record_id(),
            account_id: request.account_id.clone(),
            request_text: request.trimmed_text().map(str::to_string),
            request_image_url: request.image_urls.first().cloned(),
            prompt: outcome.prompt.clone(),
            category: outcome.category,
            credits_used: outcome.credits_used,
            cached: outcome.cached,
            created_at: Utc::now(),
        }
    }
}

/// Decision returned by a rate limiter for one named window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub admitted: bool,
    /// How long to wait before retrying. Zero when admitted.
    pub retry_after: Duration,
}

impl RateDecision {
    pub fn admit() -> Self {
        Self {
            admitted: true,
            retry_after: Duration::ZERO,
        }
    }

    pub fn deny(retry_after: Duration) -> Self {
        Self {
            admitted: false,
            retry_after,
        }
    }
}

/// Subscription tier attached to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Pro,
    Unlimited,
}

/// An account's subscription entitlement, with optional expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    pub tier: SubscriptionTier,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Entitlement {
    /// True only for a non-expired Unlimited entitlement.
    pub fn is_unlimited(&self, now: DateTime<Utc>) -> bool {
        self.tier == SubscriptionTier::Unlimited
            && self.expires_at.map_or(true, |exp| exp > now)
    }
}

/// A generation or analysis instruction template, keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub content: String,
}

/// Fully assembled instruction handed to the completion adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationInstruction {
    /// System template content (category-specific or generic).
    pub system: String,
    /// Assembled user context: text, analysis, ranked hits, exemplars.
    pub user: String,
}

/// A previously generated prompt served from cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPrompt {
    pub prompt: String,
    pub analysis: Option<AnalysisResult>,
    pub category: Option<CategoryKey>,
    pub created_at: DateTime<Utc>,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter for registry and diagnostics purposes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Vision,
    Embedding,
    Index,
    Generation,
    RateLimit,
    Progress,
    Storage,
}

/// Generates a fresh UUID v4 string for record ids.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
