// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engagement-aware re-ranking of raw similarity hits.
//!
//! Pure and deterministic: the same input slice always produces the same
//! output order. No network, no clock, no randomness.

use promptloom_core::SimilarityHit;
use tracing::debug;

/// Aesthetic score assumed when the corpus entry has none.
const DEFAULT_AESTHETIC: f32 = 5.0;

/// Multiplier applied to hand-curated corpus entries.
const CURATED_BOOST: f32 = 1.5;

/// Derive the ranking weight for one hit.
///
/// `weight = similarity * (1 + aesthetic / 10) * (curated ? 1.5 : 1)`
///
/// Aesthetic defaults to 5.0 and curation to false when absent, so an
/// unannotated hit still ranks by 1.5x its raw similarity.
pub fn weight_for(hit: &SimilarityHit) -> f32 {
    let aesthetic = hit.aesthetic_score.unwrap_or(DEFAULT_AESTHETIC);
    let curated = if hit.curated.unwrap_or(false) {
        CURATED_BOOST
    } else {
        1.0
    };
    hit.similarity * (1.0 + aesthetic / 10.0) * curated
}

/// Re-rank raw index hits: dedup by image URL, derive weights, sort.
///
/// Deduplication keeps the first occurrence of each non-empty `image_url`
/// in input order; hits with an empty URL are never deduplicated against
/// each other. The sort is stable, so equal-weight hits keep their input
/// order.
pub fn rank(hits: Vec<SimilarityHit>) -> Vec<SimilarityHit> {
    let mut seen: Vec<&str> = Vec::new();
    let mut ranked: Vec<SimilarityHit> = Vec::with_capacity(hits.len());

    for hit in &hits {
        if !hit.image_url.is_empty() {
            if seen.iter().any(|u| *u == hit.image_url) {
                debug!(
                    image_id = %hit.image_id,
                    image_url = %hit.image_url,
                    "dropping duplicate similarity hit"
                );
                continue;
            }
            seen.push(hit.image_url.as_str());
        }
        let mut hit = hit.clone();
        hit.weight = weight_for(&hit);
        ranked.push(hit);
    }

    // Stable sort; NaN cannot occur because weight_for is total over finite
    // inputs and the index never emits non-finite similarities.
    ranked.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, url: &str, similarity: f32) -> SimilarityHit {
        SimilarityHit {
            image_id: id.to_string(),
            image_url: url.to_string(),
            prompt: Some(format!("prompt for {id}")),
            similarity,
            aesthetic_score: None,
            curated: None,
            weight: 0.0,
        }
    }

    #[test]
    fn weight_defaults_apply() {
        // No aesthetic, not curated: similarity * 1.5
        let h = hit("a", "u1", 0.8);
        assert!((weight_for(&h) - 1.2).abs() < 1e-6);
    }

    #[test]
    fn curated_boost_multiplies() {
        let mut h = hit("a", "u1", 0.8);
        h.aesthetic_score = Some(8.0);
        h.curated = Some(true);
        // 0.8 * 1.8 * 1.5
        assert!((weight_for(&h) - 2.16).abs() < 1e-6);
    }

    #[test]
    fn curated_mid_similarity_outranks_uncurated_high() {
        let mut curated = hit("mid", "u1", 0.7);
        curated.curated = Some(true);
        let uncurated = hit("high", "u2", 0.9);

        let ranked = rank(vec![uncurated, curated]);
        // 0.7*1.5*1.5 = 1.575 > 0.9*1.5 = 1.35
        assert_eq!(ranked[0].image_id, "mid");
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let first = hit("first", "https://img/same.jpg", 0.6);
        let dup = hit("dup", "https://img/same.jpg", 0.9);
        let other = hit("other", "https://img/other.jpg", 0.5);

        let ranked = rank(vec![first, dup, other]);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().any(|h| h.image_id == "first"));
        assert!(!ranked.iter().any(|h| h.image_id == "dup"));
    }

    #[test]
    fn empty_urls_are_not_deduplicated() {
        let a = hit("a", "", 0.6);
        let b = hit("b", "", 0.5);
        let ranked = rank(vec![a, b]);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn sort_is_stable_for_equal_weights() {
        let a = hit("a", "u1", 0.5);
        let b = hit("b", "u2", 0.5);
        let ranked = rank(vec![a, b]);
        assert_eq!(ranked[0].image_id, "a");
        assert_eq!(ranked[1].image_id, "b");
    }

    #[test]
    fn ranking_is_deterministic() {
        let input: Vec<SimilarityHit> = (0..10)
            .map(|i| {
                let mut h = hit(&format!("h{i}"), &format!("u{i}"), 0.1 * i as f32);
                h.curated = Some(i % 2 == 0);
                h.aesthetic_score = Some(i as f32);
                h
            })
            .collect();
        let first = rank(input.clone());
        let second = rank(input);
        let ids_first: Vec<_> = first.iter().map(|h| h.image_id.clone()).collect();
        let ids_second: Vec<_> = second.iter().map(|h| h.image_id.clone()).collect();
        assert_eq!(ids_first, ids_second);
    }
}
