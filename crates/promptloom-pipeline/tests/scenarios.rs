// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end pipeline scenarios over scripted mock adapters.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use promptloom_core::{
    AnalysisResult, AuditRecord, AuditSink, CachedPrompt, CategoryExample, CategoryKey,
    CreditLedger, ExampleSource, GenerationRequest, ProgressStep, ProgressStore, PromptCache,
    PromptloomError, RequestOrigin, SimilarityHit,
};
use promptloom_pipeline::{
    FixedWindowLimiter, Pipeline, PipelineSettings, RateWindows, GUEST_MINUTE_WINDOW,
    USER_MINUTE_WINDOW,
};
use promptloom_test_utils::{
    InMemoryAuditSink, InMemoryCreditLedger, InMemoryExampleStore, InMemoryPromptCache,
    InMemoryTemplateStore, MockEmbedder, MockGenerator, MockIndex, MockRateLimiter, MockVision,
    RecordingProgressStore,
};

struct Harness {
    vision: Arc<MockVision>,
    embedder: Arc<MockEmbedder>,
    index: Arc<MockIndex>,
    generator: Arc<MockGenerator>,
    limiter: Arc<MockRateLimiter>,
    progress: Arc<RecordingProgressStore>,
    templates: Arc<InMemoryTemplateStore>,
    examples: Arc<InMemoryExampleStore>,
    ledger: Arc<InMemoryCreditLedger>,
    cache: Arc<InMemoryPromptCache>,
    audit: Arc<InMemoryAuditSink>,
}

impl Harness {
    /// Harness with the generic template installed.
    async fn new() -> Self {
        let harness = Self::bare();
        harness
            .templates
            .insert("prompt-generic", "You write image generation prompts.")
            .await;
        harness
    }

    fn bare() -> Self {
        Self {
            vision: Arc::new(MockVision::new()),
            embedder: Arc::new(MockEmbedder::new()),
            index: Arc::new(MockIndex::new()),
            generator: Arc::new(MockGenerator::new()),
            limiter: Arc::new(MockRateLimiter::new()),
            progress: Arc::new(RecordingProgressStore::new()),
            templates: Arc::new(InMemoryTemplateStore::new()),
            examples: Arc::new(InMemoryExampleStore::new()),
            ledger: Arc::new(InMemoryCreditLedger::new()),
            cache: Arc::new(InMemoryPromptCache::new()),
            audit: Arc::new(InMemoryAuditSink::new()),
        }
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline {
            vision: self.vision.clone(),
            embedder: self.embedder.clone(),
            index: self.index.clone(),
            generator: self.generator.clone(),
            limiter: self.limiter.clone(),
            progress: self.progress.clone(),
            templates: self.templates.clone(),
            examples: self.examples.clone(),
            ledger: self.ledger.clone(),
            cache: self.cache.clone(),
            audit: self.audit.clone(),
            windows: RateWindows::default(),
            settings: PipelineSettings::default(),
        }
    }
}

fn authenticated_request(text: Option<&str>, images: &[&str]) -> GenerationRequest {
    GenerationRequest {
        text: text.map(str::to_string),
        image_urls: images.iter().map(|s| s.to_string()).collect(),
        category: None,
        origin: RequestOrigin::Authenticated,
        rate_limit_key: "acct-1".into(),
        account_id: Some("acct-1".into()),
        progress_identity: Some("session-1".into()),
    }
}

fn guest_request(text: Option<&str>) -> GenerationRequest {
    GenerationRequest {
        text: text.map(str::to_string),
        image_urls: Vec::new(),
        category: None,
        origin: RequestOrigin::Guest,
        rate_limit_key: "ip:203.0.113.9".into(),
        account_id: None,
        progress_identity: Some("guest-session".into()),
    }
}

fn hit(id: &str, url: &str, similarity: f32) -> SimilarityHit {
    SimilarityHit {
        image_id: id.to_string(),
        image_url: url.to_string(),
        prompt: Some(format!("reference prompt for {id}")),
        similarity,
        aesthetic_score: Some(7.0),
        curated: Some(false),
        weight: 0.0,
    }
}

fn analysis(description: &str) -> AnalysisResult {
    AnalysisResult {
        short_description: Some(description.to_string()),
        mood: Some("serene".into()),
        lighting: Some("golden hour".into()),
        colors: vec!["#ff8800".into()],
        tags: vec!["landscape".into()],
    }
}

/// Audit sink whose writes always fail.
struct FailingAuditSink;

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn record(&self, _record: &AuditRecord) -> Result<(), PromptloomError> {
        Err(PromptloomError::Internal("audit store unavailable".into()))
    }
}

#[tokio::test]
async fn text_only_authenticated_run_charges_one_credit() {
    let harness = Harness::new().await;
    harness.ledger.set_balance("acct-1", 5).await;
    harness.embedder.push_vector(vec![0.1; 768]).await;
    harness.index.push(vec![hit("a", "https://img/a.jpg", 0.3)]).await;
    harness.generator.push("a sweeping sunset over jagged peaks").await;

    let outcome = harness
        .pipeline()
        .run(&authenticated_request(Some("sunset over mountains"), &[]))
        .await
        .unwrap();

    assert_eq!(outcome.credits_used, 1);
    assert!(!outcome.cached);
    // 0.3 similarity is below the 0.5 relevance threshold
    assert!(outcome.top_match.is_none());
    assert_eq!(outcome.recommendations.len(), 1);
    assert_eq!(harness.ledger.balance("acct-1").await.unwrap(), 4);

    let audits = harness.audit.records.lock().await;
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].credits_used, 1);
    assert!(!audits[0].cached);
}

#[tokio::test]
async fn fresh_image_and_text_run_charges_two_and_fills_the_cache() {
    let harness = Harness::new().await;
    harness.ledger.set_balance("acct-1", 5).await;
    harness.vision.push(Some(analysis("a ridge at dusk"))).await;
    harness.embedder.push_vector(vec![0.2; 768]).await;
    harness.index.push(vec![hit("a", "https://img/a.jpg", 0.9)]).await;
    harness.generator.push("a cinematic mountain ridge at dusk").await;

    let request = authenticated_request(Some("mountains"), &["https://ref/1.jpg"]);
    let outcome = harness.pipeline().run(&request).await.unwrap();

    assert_eq!(outcome.credits_used, 2);
    assert_eq!(harness.ledger.balance("acct-1").await.unwrap(), 3);
    assert!(outcome.top_match.is_some());

    let cached = harness.cache.get("https://ref/1.jpg").await.unwrap().unwrap();
    assert_eq!(cached.prompt, "a cinematic mountain ridge at dusk");
    assert!(cached.analysis.is_some());
}

#[tokio::test]
async fn cached_single_image_run_charges_one_and_skips_upstream_work() {
    let harness = Harness::new().await;
    harness.ledger.set_balance("acct-1", 5).await;
    harness
        .cache
        .put(
            "https://ref/1.jpg",
            CachedPrompt {
                prompt: "previously generated prompt".into(),
                analysis: Some(analysis("a ridge at dusk")),
                category: Some(CategoryKey::Cinematic),
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();

    let request = authenticated_request(None, &["https://ref/1.jpg"]);
    let outcome = harness.pipeline().run(&request).await.unwrap();

    assert!(outcome.cached);
    assert_eq!(outcome.credits_used, 1);
    assert_eq!(outcome.prompt, "previously generated prompt");
    assert_eq!(outcome.category, Some(CategoryKey::Cinematic));
    assert_eq!(harness.ledger.balance("acct-1").await.unwrap(), 4);

    // no upstream adapter was touched
    assert!(harness.vision.calls.lock().await.is_empty());
    assert!(harness.embedder.calls.lock().await.is_empty());
    assert!(harness.generator.calls.lock().await.is_empty());

    let audits = harness.audit.records.lock().await;
    assert!(audits[0].cached);
}

#[tokio::test]
async fn rate_limited_guest_is_rejected_without_side_effects() {
    let harness = Harness::new().await;
    harness
        .limiter
        .deny(GUEST_MINUTE_WINDOW, Duration::from_secs(42))
        .await;

    let err = harness
        .pipeline()
        .run(&guest_request(Some("anything")))
        .await
        .unwrap_err();

    match err {
        PromptloomError::RateLimited { limit, retry_after } => {
            assert_eq!(limit, GUEST_MINUTE_WINDOW);
            assert_eq!(retry_after, Duration::from_secs(42));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
    assert!(harness.progress.history.lock().await.is_empty());
    assert!(harness.vision.calls.lock().await.is_empty());
    assert!(harness.embedder.calls.lock().await.is_empty());
}

#[tokio::test]
async fn rate_limiting_takes_precedence_over_credit_checks() {
    let harness = Harness::new().await;
    // zero balance would fail the credit guard if it were reached
    harness.ledger.set_balance("acct-1", 0).await;
    harness
        .limiter
        .deny(USER_MINUTE_WINDOW, Duration::from_secs(10))
        .await;

    let err = harness
        .pipeline()
        .run(&authenticated_request(Some("hello"), &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, PromptloomError::RateLimited { .. }));
    assert!(harness.progress.history.lock().await.is_empty());
}

#[tokio::test]
async fn insufficient_credits_reject_before_any_progress() {
    let harness = Harness::new().await;
    harness.ledger.set_balance("acct-1", 1).await;

    // one image makes the provisional cost 2
    let err = harness
        .pipeline()
        .run(&authenticated_request(Some("hello"), &["https://ref/1.jpg"]))
        .await
        .unwrap_err();

    match err {
        PromptloomError::InsufficientCredits {
            required,
            available,
        } => {
            assert_eq!(required, 2);
            assert_eq!(available, 1);
        }
        other => panic!("expected InsufficientCredits, got {other:?}"),
    }
    assert!(harness.progress.history.lock().await.is_empty());
    assert!(harness.vision.calls.lock().await.is_empty());
    assert_eq!(harness.ledger.balance("acct-1").await.unwrap(), 1);
}

#[tokio::test]
async fn vision_timeout_without_text_fails_with_nothing_to_embed() {
    let harness = Harness::new().await;
    harness.ledger.set_balance("acct-1", 5).await;
    harness.vision.push(None).await;

    let request = authenticated_request(None, &["https://ref/slow.jpg"]);
    let err = harness.pipeline().run(&request).await.unwrap_err();

    assert!(matches!(err, PromptloomError::GenerationEmpty));
    let record = harness.progress.get("session-1").await.unwrap().unwrap();
    assert_eq!(record.step, ProgressStep::Error);
    assert_eq!(record.detail, "nothing to embed");
    // rejection mid-pipeline still charges nothing
    assert_eq!(harness.ledger.balance("acct-1").await.unwrap(), 5);
    assert!(harness.audit.records.lock().await.is_empty());
}

#[tokio::test]
async fn vision_timeout_with_text_degrades_and_still_succeeds() {
    let harness = Harness::new().await;
    harness.ledger.set_balance("acct-1", 5).await;
    harness.vision.push(None).await;
    harness.embedder.push_vector(vec![0.3; 768]).await;
    harness.index.push(vec![]).await;
    harness.generator.push("a prompt from text alone").await;

    let request = authenticated_request(Some("neon alley"), &["https://ref/slow.jpg"]);
    let outcome = harness.pipeline().run(&request).await.unwrap();

    assert_eq!(outcome.prompt, "a prompt from text alone");
    assert!(outcome.analysis.is_none());
    assert_eq!(outcome.credits_used, 2);
    // the embedder saw only the caller text
    assert_eq!(harness.embedder.calls.lock().await[0], "neon alley");
}

#[tokio::test]
async fn vision_error_is_skipped_and_the_next_image_wins() {
    let harness = Harness::new().await;
    harness.ledger.set_balance("acct-1", 5).await;
    harness.vision.push_failure("upstream 502").await;
    harness
        .vision
        .push(Some(analysis("a lighthouse in fog")))
        .await;
    harness.embedder.push_vector(vec![0.2; 768]).await;
    harness.index.push(vec![]).await;
    harness.generator.push("a fog-wrapped lighthouse").await;

    let request =
        authenticated_request(None, &["https://ref/bad.jpg", "https://ref/good.jpg"]);
    let outcome = harness.pipeline().run(&request).await.unwrap();

    assert_eq!(outcome.prompt, "a fog-wrapped lighthouse");
    assert!(outcome.analysis.is_some());
    // the failing image was attempted, then skipped
    assert_eq!(harness.vision.calls.lock().await.len(), 2);
    assert_eq!(harness.embedder.calls.lock().await[0], "a lighthouse in fog");
}

#[tokio::test]
async fn embedding_failure_disables_search_but_the_run_succeeds() {
    let harness = Harness::new().await;
    harness.ledger.set_balance("acct-1", 5).await;
    harness.embedder.push_failure("upstream 500").await;
    harness.generator.push("generated without retrieval").await;

    let outcome = harness
        .pipeline()
        .run(&authenticated_request(Some("foggy harbor"), &[]))
        .await
        .unwrap();

    assert_eq!(outcome.prompt, "generated without retrieval");
    assert!(outcome.recommendations.is_empty());
    assert!(outcome.top_match.is_none());
    assert!(harness.index.calls.lock().await.is_empty());
}

#[tokio::test]
async fn duplicate_hit_urls_keep_only_the_first_occurrence() {
    let harness = Harness::new().await;
    harness.ledger.set_balance("acct-1", 5).await;
    harness.embedder.push_vector(vec![0.4; 768]).await;
    harness
        .index
        .push(vec![
            hit("a", "https://img/same.jpg", 0.9),
            hit("b", "https://img/same.jpg", 0.8),
            hit("c", "https://img/other.jpg", 0.7),
        ])
        .await;
    harness.generator.push("p").await;

    let outcome = harness
        .pipeline()
        .run(&authenticated_request(Some("dupes"), &[]))
        .await
        .unwrap();

    assert_eq!(outcome.recommendations.len(), 2);
    assert_eq!(outcome.recommendations[0].image_id, "a");
    assert_eq!(outcome.recommendations[1].image_id, "c");
}

#[tokio::test]
async fn second_guest_call_within_a_minute_hits_the_fixed_window() {
    let harness = Harness::new().await;
    harness.embedder.push_vector(vec![0.5; 768]).await;
    harness.index.push(vec![]).await;
    harness.generator.push("first prompt").await;

    let mut pipeline = harness.pipeline();
    pipeline.limiter = Arc::new(FixedWindowLimiter::new(&pipeline.windows));

    let request = guest_request(Some("first"));
    pipeline.run(&request).await.unwrap();
    let written_steps = harness.progress.history.lock().await.len();

    let err = pipeline.run(&guest_request(Some("second"))).await.unwrap_err();
    match err {
        PromptloomError::RateLimited { retry_after, .. } => {
            assert!(retry_after <= Duration::from_secs(60));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
    // the rejected call wrote no progress at all
    assert_eq!(harness.progress.history.lock().await.len(), written_steps);
}

#[tokio::test]
async fn unlimited_entitlement_bypasses_rate_windows() {
    let harness = Harness::new().await;
    harness.ledger.set_balance("acct-1", 5).await;
    harness
        .ledger
        .set_entitlement(
            "acct-1",
            promptloom_core::Entitlement {
                tier: promptloom_core::SubscriptionTier::Unlimited,
                expires_at: None,
            },
        )
        .await;
    harness
        .limiter
        .deny(USER_MINUTE_WINDOW, Duration::from_secs(60))
        .await;
    harness.embedder.push_vector(vec![0.6; 768]).await;
    harness.index.push(vec![]).await;
    harness.generator.push("unlimited prompt").await;

    let outcome = harness
        .pipeline()
        .run(&authenticated_request(Some("go"), &[]))
        .await
        .unwrap();

    assert_eq!(outcome.prompt, "unlimited prompt");
    // the limiter was never consulted
    assert!(harness.limiter.checks.lock().await.is_empty());
    // credits are still charged; only limiting is bypassed
    assert_eq!(harness.ledger.balance("acct-1").await.unwrap(), 4);
}

#[tokio::test]
async fn explicit_category_with_exemplars_selects_the_category_template() {
    let harness = Harness::new().await;
    harness.ledger.set_balance("acct-1", 5).await;
    harness
        .templates
        .insert("prompt-anime", "You write anime-style prompts.")
        .await;
    harness
        .examples
        .insert(
            CategoryKey::Anime,
            CategoryExample {
                prompt: "a heroine under cherry blossoms".into(),
                rating: 95,
                source: ExampleSource::Curated,
            },
        )
        .await;
    harness.embedder.push_vector(vec![0.7; 768]).await;
    harness.index.push(vec![]).await;
    harness.generator.push("an anime prompt").await;

    let mut request = authenticated_request(Some("a duel at dawn"), &[]);
    request.category = Some(CategoryKey::Anime);
    harness.pipeline().run(&request).await.unwrap();

    let calls = harness.generator.calls.lock().await;
    assert_eq!(calls[0].system, "You write anime-style prompts.");
    assert!(calls[0].user.contains("a heroine under cherry blossoms"));
}

#[tokio::test]
async fn missing_generic_template_is_a_hard_failure() {
    let harness = Harness::bare();
    harness.ledger.set_balance("acct-1", 5).await;
    harness.embedder.push_vector(vec![0.8; 768]).await;
    harness.index.push(vec![]).await;

    let err = harness
        .pipeline()
        .run(&authenticated_request(Some("anything"), &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, PromptloomError::ConfigurationMissing(_)));
    let record = harness.progress.get("session-1").await.unwrap().unwrap();
    assert_eq!(record.step, ProgressStep::Error);
}

#[tokio::test]
async fn empty_request_errors_after_progress_initialization() {
    let harness = Harness::new().await;

    let mut request = guest_request(None);
    request.text = Some("   ".into());
    let err = harness.pipeline().run(&request).await.unwrap_err();

    assert!(matches!(err, PromptloomError::NoInput));
    let steps = harness.progress.steps_for("guest-session").await;
    assert_eq!(steps, vec![ProgressStep::Initializing, ProgressStep::Error]);
}

#[tokio::test]
async fn audit_sink_failure_does_not_fail_a_billed_run() {
    let harness = Harness::new().await;
    harness.ledger.set_balance("acct-1", 5).await;
    harness.embedder.push_vector(vec![0.1; 768]).await;
    harness.index.push(vec![]).await;
    harness.generator.push("billed and delivered").await;

    let mut pipeline = harness.pipeline();
    pipeline.audit = Arc::new(FailingAuditSink);

    let outcome = pipeline
        .run(&authenticated_request(Some("harbor at dawn"), &[]))
        .await
        .unwrap();

    // the charge stands and the run still reaches Complete
    assert_eq!(outcome.credits_used, 1);
    assert_eq!(harness.ledger.balance("acct-1").await.unwrap(), 4);
    let steps = harness.progress.steps_for("session-1").await;
    assert_eq!(steps.last(), Some(&ProgressStep::Complete));
}

#[tokio::test]
async fn successful_text_run_walks_the_full_step_sequence() {
    let harness = Harness::new().await;
    harness.ledger.set_balance("acct-1", 5).await;
    harness.embedder.push_vector(vec![0.9; 768]).await;
    harness
        .index
        .push(vec![hit("a", "https://img/a.jpg", 0.8)])
        .await;
    harness.generator.push("final prompt").await;

    harness
        .pipeline()
        .run(&authenticated_request(Some("city at night"), &[]))
        .await
        .unwrap();

    let steps = harness.progress.steps_for("session-1").await;
    assert_eq!(
        steps,
        vec![
            ProgressStep::Initializing,
            ProgressStep::Embedding,
            ProgressStep::Searching,
            ProgressStep::Generating,
            ProgressStep::Complete,
        ]
    );
    // terminal success clears the live record
    assert!(harness.progress.get("session-1").await.unwrap().is_none());

    // the searching step carried the preview payload
    let history = harness.progress.history.lock().await;
    let searching = history
        .iter()
        .find(|r| r.step == ProgressStep::Searching)
        .unwrap();
    assert_eq!(searching.similar_count, Some(1));
    assert_eq!(searching.similar_preview.len(), 1);
}
