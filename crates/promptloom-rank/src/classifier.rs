// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic style-category detection from a vision analysis.
//!
//! Keyword membership over tags and the short description, evaluated in a
//! fixed priority order. Zero cost, no network, no LLM pre-call.

use promptloom_core::{AnalysisResult, CategoryKey};
use tracing::debug;

/// Keyword buckets in detection priority order; the first bucket with a
/// match wins. `Realistic` is the fallback and has no bucket.
const CATEGORY_KEYWORDS: &[(CategoryKey, &[&str])] = &[
    (
        CategoryKey::YoutubeThumbnail,
        &["youtube", "thumbnail", "clickbait", "reaction face"],
    ),
    (
        CategoryKey::Anime,
        &["anime", "manga", "chibi", "cel shading", "waifu"],
    ),
    (
        CategoryKey::Logo,
        &["logo", "emblem", "wordmark", "lettermark", "brand mark", "monogram"],
    ),
    (
        CategoryKey::Product,
        &["product", "packshot", "packaging", "studio shot", "advertisement", "mockup"],
    ),
    (
        CategoryKey::Abstract,
        &["abstract", "geometric", "fractal", "generative pattern", "gradient field"],
    ),
    (
        CategoryKey::Cinematic,
        &["cinematic", "film still", "movie scene", "anamorphic", "dramatic lighting"],
    ),
    (
        CategoryKey::Illustration,
        &["illustration", "drawing", "sketch", "watercolor", "vector art", "cartoon", "digital painting"],
    ),
];

/// Detect the style category of an analyzed image.
///
/// Matches keywords case-insensitively against every tag and the short
/// description. Returns `Realistic` when nothing matches or the analysis
/// is empty.
pub fn detect(analysis: &AnalysisResult) -> CategoryKey {
    let mut haystacks: Vec<String> = analysis.tags.iter().map(|t| t.to_lowercase()).collect();
    if let Some(desc) = &analysis.short_description {
        haystacks.push(desc.to_lowercase());
    }

    for (category, keywords) in CATEGORY_KEYWORDS {
        let matched = haystacks
            .iter()
            .any(|h| keywords.iter().any(|k| h.contains(k)));
        if matched {
            debug!(category = %category, "style category matched");
            return *category;
        }
    }

    debug!("no category keywords matched, defaulting to realistic");
    CategoryKey::Realistic
}
