// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Promptloom pipeline.
//!
//! External-service adapters extend the [`PluginAdapter`] base trait; the
//! in-process collaborators (rate limiter, progress store, ledger, caches)
//! are plain async traits. All use `#[async_trait]` for dynamic dispatch.

pub mod adapter;
pub mod audit;
pub mod cache;
pub mod credits;
pub mod embedding;
pub mod examples;
pub mod generation;
pub mod index;
pub mod progress;
pub mod rate_limit;
pub mod template;
pub mod vision;

// Re-export all traits at the traits module level for convenience.
pub use adapter::PluginAdapter;
pub use audit::AuditSink;
pub use cache::PromptCache;
pub use credits::CreditLedger;
pub use embedding::Embedder;
pub use examples::ExampleStore;
pub use generation::PromptGenerator;
pub use index::VectorIndex;
pub use progress::ProgressStore;
pub use rate_limit::RateLimiter;
pub use template::TemplateStore;
pub use vision::VisionAnalyzer;
