// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Promptloom pipeline.
//!
//! A single database file backs the credit ledger, audit log, prompt cache,
//! category exemplars, and the brute-force vector index. All stores share
//! one tokio-rusqlite connection through [`Database`].

pub mod audit;
pub mod cache;
pub mod credits;
pub mod database;
pub mod examples;
pub mod index;

pub use audit::SqliteAuditSink;
pub use cache::SqlitePromptCache;
pub use credits::SqliteCreditLedger;
pub use database::Database;
pub use examples::SqliteExampleStore;
pub use index::{cosine_similarity, CorpusImage, SqliteVectorIndex};
