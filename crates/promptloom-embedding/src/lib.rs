// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text embedding adapter for the Promptloom pipeline.
//!
//! Provides [`EmbeddingClient`], an HTTP implementation of the
//! [`Embedder`](promptloom_core::Embedder) trait against a Google-style
//! `:embedContent` endpoint.

pub mod client;

pub use client::EmbeddingClient;
