// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pipeline orchestration for Promptloom.
//!
//! [`Pipeline`] drives one generation request through entry guards, the
//! analysis/embedding/search/generation stages, billing, and audit. The
//! crate also ships the default in-process collaborators: a fixed-window
//! rate limiter and a map-backed progress store.

pub mod limiter;
pub mod limits;
pub mod orchestrator;
pub mod progress;

pub use limiter::FixedWindowLimiter;
pub use limits::{
    RateWindows, WindowSpec, GUEST_HOUR_WINDOW, GUEST_MINUTE_WINDOW, USER_HOUR_WINDOW,
    USER_MINUTE_WINDOW,
};
pub use orchestrator::{Pipeline, PipelineSettings};
pub use progress::InMemoryProgressStore;
