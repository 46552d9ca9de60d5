// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths, positive window sizes, and the
//! embedding dimensionality contract.

use crate::diagnostic::ConfigError;
use crate::model::PromptloomConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PromptloomConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate database_path is not empty
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Validate all rate-limit windows are positive
    let windows = [
        ("limits.guest_per_minute", config.limits.guest_per_minute),
        ("limits.guest_per_hour", config.limits.guest_per_hour),
        ("limits.user_per_minute", config.limits.user_per_minute),
        ("limits.user_per_hour", config.limits.user_per_hour),
    ];
    for (name, value) in windows {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{name} must be at least 1, got 0"),
            });
        }
    }

    // Validate polling bounds are positive
    if config.vision.poll_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "vision.poll_interval_secs must be at least 1, got 0".to_string(),
        });
    }
    if config.vision.max_poll_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "vision.max_poll_attempts must be at least 1, got 0".to_string(),
        });
    }

    // Validate the relevance threshold is a sensible similarity bound
    let threshold = config.search.relevance_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        errors.push(ConfigError::Validation {
            message: format!(
                "search.relevance_threshold must be within [0.0, 1.0], got {threshold}"
            ),
        });
    }

    // The ranker and index assume a fixed embedding space.
    if config.embedding.dimensions != promptloom_core::EMBEDDING_DIMENSIONS {
        errors.push(ConfigError::Validation {
            message: format!(
                "embedding.dimensions must be {}, got {}",
                promptloom_core::EMBEDDING_DIMENSIONS,
                config.embedding.dimensions
            ),
        });
    }

    if config.embedding.max_input_chars == 0 {
        errors.push(ConfigError::Validation {
            message: "embedding.max_input_chars must be at least 1, got 0".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
