// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered fallback chain for the final prompt.
//!
//! Degradation order is an explicit list of producers rather than nested
//! conditionals: adding a fallback means adding an entry, and the order is
//! visible in one place.

use promptloom_core::AnalysisResult;

/// A candidate prompt source; `None` or blank output defers to the next.
pub type PromptProducer<'a> = Box<dyn Fn() -> Option<String> + Send + 'a>;

/// Evaluate producers in order, returning the first non-blank prompt.
pub fn first_usable(producers: &[PromptProducer<'_>]) -> Option<String> {
    producers.iter().find_map(|producer| {
        producer()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
    })
}

/// The standard chain: generated text, then the raw analysis description.
///
/// Returns `None` when every producer comes up empty; the orchestrator maps
/// that to a `GenerationEmpty` failure.
pub fn resolve_prompt(generated: &str, analysis: Option<&AnalysisResult>) -> Option<String> {
    let producers: Vec<PromptProducer<'_>> = vec![
        Box::new(move || Some(generated.to_string())),
        Box::new(move || analysis.and_then(|a| a.short_description.clone())),
    ];
    first_usable(&producers)
}
