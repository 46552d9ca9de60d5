// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./promptloom.toml` > `~/.config/promptloom/promptloom.toml`
//! > `/etc/promptloom/promptloom.toml` with environment variable overrides via
//! `PROMPTLOOM_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PromptloomConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/promptloom/promptloom.toml` (system-wide)
/// 3. `~/.config/promptloom/promptloom.toml` (user XDG config)
/// 4. `./promptloom.toml` (local directory)
/// 5. `PROMPTLOOM_*` environment variables
pub fn load_config() -> Result<PromptloomConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PromptloomConfig::default()))
        .merge(Toml::file("/etc/promptloom/promptloom.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("promptloom/promptloom.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("promptloom.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<PromptloomConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PromptloomConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PromptloomConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PromptloomConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// CRITICAL: Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `PROMPTLOOM_VISION_API_KEY`
/// must map to `vision.api_key`, not `vision.api.key`.
fn env_provider() -> Env {
    Env::prefixed("PROMPTLOOM_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: PROMPTLOOM_EMBEDDING_MAX_INPUT_CHARS -> "embedding_max_input_chars"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("limits_", "limits.", 1)
            .replacen("credits_", "credits.", 1)
            .replacen("vision_", "vision.", 1)
            .replacen("embedding_", "embedding.", 1)
            .replacen("generation_", "generation.", 1)
            .replacen("search_", "search.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("pipeline_", "pipeline.", 1);
        mapped.into()
    })
}
