// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock adapters and in-memory stores for Promptloom tests.
//!
//! The external-service mocks are scripted: tests queue responses that are
//! consumed FIFO, one per call. An exhausted script is a test bug and
//! panics with a clear message. The in-memory stores are plain
//! Mutex-guarded maps implementing the storage traits.

pub mod mock_adapters;
pub mod mock_stores;

pub use mock_adapters::{
    MockEmbedder, MockGenerator, MockIndex, MockRateLimiter, MockVision,
};
pub use mock_stores::{
    InMemoryAuditSink, InMemoryCreditLedger, InMemoryExampleStore, InMemoryPromptCache,
    InMemoryTemplateStore, RecordingProgressStore,
};
