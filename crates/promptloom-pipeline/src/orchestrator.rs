// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The pipeline orchestrator.
//!
//! Runs one generation request through its stages: entry guards, optional
//! cached short-circuit, vision analysis, embedding, similarity search and
//! ranking, category resolution, prompt generation, then billing and audit.
//! External-service failures degrade the run; only guard rejections,
//! progress-store faults, missing templates, and an exhausted fallback
//! chain abort it. Audit and cache writes after billing are best effort.

use std::sync::Arc;

use chrono::Utc;
use promptloom_core::{
    AnalysisResult, AuditRecord, AuditSink, CachedPrompt, CreditLedger, Embedder, ExampleStore,
    GenerationOutcome, GenerationRequest, ProgressRecord, ProgressStep, ProgressStore,
    PromptCache, PromptGenerator, PromptloomError, RateLimiter, SimilarityHit, TemplateStore,
    VectorIndex, VisionAnalyzer,
};
use promptloom_generate::{build_instruction, resolve_prompt, ContextInputs};
use promptloom_rank::{detect, rank};
use tracing::{debug, info, warn};

use crate::limits::RateWindows;

/// Tunable pipeline knobs, typically mapped from configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Raw candidates fetched from the index before ranking.
    pub candidate_limit: usize,
    /// Ranked hits returned as recommendations.
    pub max_recommendations: usize,
    /// Minimum raw similarity for the best hit to count as a top match.
    pub relevance_threshold: f32,
    /// Category exemplars included in the generation context.
    pub max_examples: usize,
    /// Reference images processed per request.
    pub max_images: usize,
    /// Flat cost charged for every generation.
    pub base_cost: u32,
    /// Cost charged when the prompt is served from cache.
    pub cached_cost: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            candidate_limit: 20,
            max_recommendations: 5,
            relevance_threshold: 0.5,
            max_examples: 3,
            max_images: 5,
            base_cost: 1,
            cached_cost: 1,
        }
    }
}

/// The assembled pipeline. All collaborators are trait objects so tests and
/// the CLI wire in whatever implementations they need.
pub struct Pipeline {
    pub vision: Arc<dyn VisionAnalyzer>,
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<dyn VectorIndex>,
    pub generator: Arc<dyn PromptGenerator>,
    pub limiter: Arc<dyn RateLimiter>,
    pub progress: Arc<dyn ProgressStore>,
    pub templates: Arc<dyn TemplateStore>,
    pub examples: Arc<dyn ExampleStore>,
    pub ledger: Arc<dyn CreditLedger>,
    pub cache: Arc<dyn PromptCache>,
    pub audit: Arc<dyn AuditSink>,
    pub windows: RateWindows,
    pub settings: PipelineSettings,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("windows", &self.windows)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Runs one request to a single terminal state.
    ///
    /// Guard rejections (rate limit, credit eligibility) happen before any
    /// progress or billing side effect. Once past the guards, any error
    /// writes an `Error` progress step and propagates; credits are charged
    /// exactly once, at terminal success.
    pub async fn run(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, PromptloomError> {
        let unlimited = self.has_unlimited_entitlement(request).await?;

        if !unlimited {
            self.check_rate_windows(request).await?;
        }

        let cost = self.provisional_cost(request.image_count());
        if let Some(account_id) = &request.account_id {
            let available = self.ledger.balance(account_id).await?;
            if available < cost {
                return Err(PromptloomError::InsufficientCredits {
                    required: cost,
                    available,
                });
            }
        }

        if let Some(identity) = request.progress_identity.as_deref() {
            self.progress.clear(identity).await?;
            self.progress
                .upsert(ProgressRecord::new(
                    identity,
                    ProgressStep::Initializing,
                    "request accepted",
                ))
                .await?;
        }

        match self.run_stages(request, cost).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.fail_progress(request, &err.to_string()).await;
                Err(err)
            }
        }
    }

    async fn run_stages(
        &self,
        request: &GenerationRequest,
        cost: u32,
    ) -> Result<GenerationOutcome, PromptloomError> {
        if request.is_empty() {
            return Err(PromptloomError::NoInput);
        }

        if let [image_url] = request.image_urls.as_slice() {
            if let Some(cached) = self.cache.get(image_url).await? {
                return self.finish_cached(request, cached).await;
            }
        }

        let primary = self.analyze_images(request).await?;

        self.report(request, ProgressStep::Embedding, "embedding request context")
            .await?;
        let embed_input = embedding_input(request, primary.as_ref());
        if embed_input.is_empty() {
            self.fail_progress(request, "nothing to embed").await;
            return Err(PromptloomError::GenerationEmpty);
        }
        let vector = match self.embedder.embed(&embed_input).await {
            Ok(vector) => Some(vector),
            Err(err) => {
                warn!(error = %err, "embedding failed, search disabled for this run");
                None
            }
        };

        let ranked = match &vector {
            Some(vector) => self.search(request, vector).await?,
            None => Vec::new(),
        };
        let top_match = ranked
            .first()
            .filter(|hit| hit.similarity >= self.settings.relevance_threshold)
            .cloned();
        let recommendations: Vec<SimilarityHit> = ranked
            .iter()
            .take(self.settings.max_recommendations)
            .cloned()
            .collect();

        let category = request
            .category
            .or_else(|| primary.as_ref().map(detect));

        self.report(request, ProgressStep::Generating, "generating prompt")
            .await?;
        let examples = match category {
            Some(category) => {
                self.examples
                    .top_examples(category, self.settings.max_examples)
                    .await?
            }
            None => Vec::new(),
        };
        let instruction = build_instruction(
            self.templates.as_ref(),
            ContextInputs {
                text: request.trimmed_text(),
                analysis: primary.as_ref(),
                hits: &ranked,
                explicit_category: request.category,
                examples: &examples,
            },
        )
        .await?;
        let generated = self.generator.generate(&instruction).await?;
        let prompt = resolve_prompt(&generated, primary.as_ref())
            .ok_or(PromptloomError::GenerationEmpty)?;

        let credits_used = self.charge(request, cost).await?;
        let outcome = GenerationOutcome {
            prompt,
            top_match,
            recommendations,
            analysis: primary.clone(),
            category,
            credits_used,
            cached: false,
        };
        self.record_audit(request, &outcome).await;

        if let [image_url] = request.image_urls.as_slice() {
            let cached = CachedPrompt {
                prompt: outcome.prompt.clone(),
                analysis: primary,
                category,
                created_at: Utc::now(),
            };
            if let Err(err) = self.cache.put(image_url, cached).await {
                warn!(error = %err, "prompt cache write failed");
            }
        }

        self.finish_progress(request).await?;
        info!(
            credits = credits_used,
            recommendations = outcome.recommendations.len(),
            "generation complete"
        );
        Ok(outcome)
    }

    /// Cache hit: skip all upstream work, bill the cached rate, audit as
    /// cached.
    async fn finish_cached(
        &self,
        request: &GenerationRequest,
        cached: CachedPrompt,
    ) -> Result<GenerationOutcome, PromptloomError> {
        let credits_used = self.charge(request, self.settings.cached_cost).await?;
        let outcome = GenerationOutcome {
            prompt: cached.prompt,
            top_match: None,
            recommendations: Vec::new(),
            analysis: cached.analysis,
            category: cached.category,
            credits_used,
            cached: true,
        };
        self.record_audit(request, &outcome).await;
        self.finish_progress(request).await?;
        info!(credits = credits_used, "served from prompt cache");
        Ok(outcome)
    }

    /// Analyzes each reference image in order; the first usable analysis
    /// becomes primary. Per-image failures degrade to none.
    async fn analyze_images(
        &self,
        request: &GenerationRequest,
    ) -> Result<Option<AnalysisResult>, PromptloomError> {
        if request.image_urls.is_empty() {
            return Ok(None);
        }
        self.report(
            request,
            ProgressStep::Analyzing,
            format!("analyzing {} reference images", request.image_count()),
        )
        .await?;

        let mut primary = None;
        for image_url in request.image_urls.iter().take(self.settings.max_images) {
            match self.vision.analyze(image_url).await {
                Ok(Some(analysis)) if primary.is_none() && !analysis.is_empty() => {
                    primary = Some(analysis);
                }
                Ok(Some(_)) => {}
                Ok(None) => debug!(image_url, "no analysis for reference image"),
                Err(err) => {
                    warn!(image_url, error = %err, "vision analysis failed, skipping image");
                }
            }
        }
        Ok(primary)
    }

    /// Writes the audit row for a billed result. The charge has already
    /// happened, so a sink failure is logged rather than failing the run.
    async fn record_audit(&self, request: &GenerationRequest, outcome: &GenerationOutcome) {
        if let Err(err) = self
            .audit
            .record(&AuditRecord::from_outcome(request, outcome))
            .await
        {
            warn!(error = %err, "audit write failed after billing");
        }
    }

    /// Queries the public corpus and ranks the hits. Index failures degrade
    /// to an empty result set.
    async fn search(
        &self,
        request: &GenerationRequest,
        vector: &[f32],
    ) -> Result<Vec<SimilarityHit>, PromptloomError> {
        let hits = match self
            .index
            .query(vector, self.settings.candidate_limit, true)
            .await
        {
            Ok(hits) => hits,
            Err(err) => {
                warn!(error = %err, "similarity search failed, continuing without hits");
                Vec::new()
            }
        };
        let ranked = rank(hits);

        if let Some(identity) = request.progress_identity.as_deref() {
            let mut record = ProgressRecord::new(
                identity,
                ProgressStep::Searching,
                format!("found {} similar images", ranked.len()),
            );
            record.similar_count = Some(ranked.len());
            record.similar_preview = ranked.iter().take(3).map(SimilarityHit::preview).collect();
            self.progress.upsert(record).await?;
        }
        Ok(ranked)
    }

    /// Deducts credits for an authenticated request; guests pay nothing.
    async fn charge(
        &self,
        request: &GenerationRequest,
        amount: u32,
    ) -> Result<u32, PromptloomError> {
        match &request.account_id {
            Some(account_id) => {
                self.ledger.charge(account_id, amount).await?;
                Ok(amount)
            }
            None => Ok(0),
        }
    }

    fn provisional_cost(&self, image_count: usize) -> u32 {
        // ceil(n * 0.5) per image on top of the flat base cost
        self.settings.base_cost + (image_count as u32 + 1) / 2
    }

    async fn has_unlimited_entitlement(
        &self,
        request: &GenerationRequest,
    ) -> Result<bool, PromptloomError> {
        let Some(account_id) = &request.account_id else {
            return Ok(false);
        };
        let entitlement = self.ledger.entitlement(account_id).await?;
        Ok(entitlement.map_or(false, |e| e.is_unlimited(Utc::now())))
    }

    async fn check_rate_windows(
        &self,
        request: &GenerationRequest,
    ) -> Result<(), PromptloomError> {
        let key = match &request.account_id {
            Some(account_id) => account_id.as_str(),
            None => request.rate_limit_key.as_str(),
        };
        for spec in self.windows.for_origin(request.origin) {
            let decision = self.limiter.check(spec.name, key).await?;
            if !decision.admitted {
                return Err(PromptloomError::RateLimited {
                    limit: spec.name.to_string(),
                    retry_after: decision.retry_after,
                });
            }
        }
        Ok(())
    }

    async fn report(
        &self,
        request: &GenerationRequest,
        step: ProgressStep,
        detail: impl Into<String>,
    ) -> Result<(), PromptloomError> {
        if let Some(identity) = request.progress_identity.as_deref() {
            self.progress
                .upsert(ProgressRecord::new(identity, step, detail))
                .await?;
        }
        Ok(())
    }

    /// Writes the terminal `Error` step. The first error detail written for
    /// an identity wins; progress failures here are logged, not propagated,
    /// so they never mask the pipeline error.
    async fn fail_progress(&self, request: &GenerationRequest, detail: &str) {
        let Some(identity) = request.progress_identity.as_deref() else {
            return;
        };
        if let Ok(Some(record)) = self.progress.get(identity).await {
            if record.step == ProgressStep::Error {
                return;
            }
        }
        if let Err(err) = self
            .progress
            .upsert(ProgressRecord::new(identity, ProgressStep::Error, detail))
            .await
        {
            warn!(error = %err, "failed to record error progress");
        }
    }

    async fn finish_progress(&self, request: &GenerationRequest) -> Result<(), PromptloomError> {
        if let Some(identity) = request.progress_identity.as_deref() {
            self.progress
                .upsert(ProgressRecord::new(
                    identity,
                    ProgressStep::Complete,
                    "prompt ready",
                ))
                .await?;
            self.progress.clear(identity).await?;
        }
        Ok(())
    }
}

/// Combined embedding input: caller text plus the primary image description.
fn embedding_input(request: &GenerationRequest, primary: Option<&AnalysisResult>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(text) = request.trimmed_text() {
        parts.push(text);
    }
    if let Some(desc) = primary.and_then(|a| a.short_description.as_deref()) {
        let desc = desc.trim();
        if !desc.is_empty() {
            parts.push(desc);
        }
    }
    parts.join("\n")
}
