// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vision analysis adapter for the Promptloom pipeline.
//!
//! Provides [`VisionClient`], an HTTP implementation of the
//! [`VisionAnalyzer`](promptloom_core::VisionAnalyzer) trait with bounded
//! result polling, plus the response-shape extraction strategies in
//! [`extract`].

pub mod client;
pub mod clock;
pub mod extract;

pub use client::VisionClient;
pub use clock::{Clock, TokioClock};
