// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Promptloom prompt-generation pipeline.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Promptloom workspace. All adapter
//! implementations live in sibling crates and implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PromptloomError;
pub use types::{
    new_record_id, AdapterType, AnalysisResult, AuditRecord, CachedPrompt, CategoryExample,
    CategoryKey, Entitlement, ExampleSource, GenerationInstruction, GenerationOutcome,
    GenerationRequest, HealthStatus, ProgressRecord, ProgressStep, PromptTemplate, RateDecision,
    RequestOrigin, SimilarPreview, SimilarityHit, SubscriptionTier, EMBEDDING_DIMENSIONS,
    MAX_IMAGES_PER_REQUEST,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    AuditSink, CreditLedger, Embedder, ExampleStore, PluginAdapter, ProgressStore, PromptCache,
    PromptGenerator, RateLimiter, TemplateStore, VectorIndex, VisionAnalyzer,
};
