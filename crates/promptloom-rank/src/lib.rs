// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Similarity ranking and style-category classification.
//!
//! Both halves are pure functions over in-memory data: the ranker turns raw
//! index hits into a weighted, deduplicated ordering, and the classifier
//! maps a vision analysis to a style category.

pub mod classifier;
pub mod ranker;

pub use classifier::detect;
pub use ranker::{rank, weight_for};
