// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rich diagnostics for misconfigured promptloom installs.
//!
//! Deserialization failures from figment and semantic failures from
//! validation both surface as `ConfigError`, which miette renders with a
//! span into the offending TOML, the keys the section actually accepts,
//! and a Jaro-Winkler "did you mean" suggestion drawn from the promptloom
//! key vocabulary.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// The configuration sections, in model declaration order.
const SECTION_NAMES: &[&str] = &[
    "limits",
    "credits",
    "vision",
    "embedding",
    "generation",
    "search",
    "storage",
    "pipeline",
];

/// Declared keys per section. Kept in sync with the model structs; the
/// `section_table_matches_the_model` test guards against drift.
const SECTION_FIELDS: &[(&str, &[&str])] = &[
    (
        "limits",
        &["guest_per_minute", "guest_per_hour", "user_per_minute", "user_per_hour"],
    ),
    ("credits", &["base_cost", "cached_cost"]),
    (
        "vision",
        &["base_url", "api_key", "poll_interval_secs", "max_poll_attempts", "request_timeout_secs"],
    ),
    (
        "embedding",
        &["base_url", "api_key", "model", "dimensions", "max_input_chars"],
    ),
    (
        "generation",
        &["base_url", "api_key", "model", "request_timeout_secs"],
    ),
    (
        "search",
        &["candidate_limit", "max_recommendations", "relevance_threshold", "max_examples", "max_images"],
    ),
    ("storage", &["database_path", "wal_mode"]),
    ("pipeline", &["log_level"]),
];

/// Jaro-Winkler score below which a candidate is not worth suggesting.
/// Tuned against the vocabulary above: `relevance_treshold` and `api_kye`
/// clear it, unrelated keys do not.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, rendered through miette.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key no section of the model declares, e.g. `embedding.modle`.
    #[error("unrecognized configuration key `{key_path}`")]
    #[diagnostic(
        code(promptloom::config::unrecognized_key),
        help("{}", suggestion_help(suggestion.as_deref(), known_keys))
    )]
    UnrecognizedKey {
        /// Dotted path of the offending key, section included.
        key_path: String,
        /// Closest declared key, when one is plausible.
        suggestion: Option<String>,
        /// Comma-separated keys the section accepts.
        known_keys: String,
        #[label("not a promptloom setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong TOML type, e.g. a quoted number.
    #[error("configuration key `{key_path}` has the wrong type")]
    #[diagnostic(
        code(promptloom::config::invalid_type),
        help("found {found}, expected {expected}")
    )]
    InvalidType {
        /// Dotted path of the offending key.
        key_path: String,
        /// The TOML type that was found.
        found: String,
        /// The type the model expects.
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A well-typed value that fails a semantic constraint, such as a
    /// zero rate window or an out-of-range relevance threshold.
    #[error("invalid configuration value: {message}")]
    #[diagnostic(code(promptloom::config::invalid_value))]
    Validation {
        /// Description of the violated constraint.
        message: String,
    },

    /// Anything figment reports that does not fit the cases above.
    #[error("configuration error: {0}")]
    #[diagnostic(code(promptloom::config::other))]
    Other(String),
}

fn suggestion_help(suggestion: Option<&str>, known_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? this section accepts: {known_keys}"),
        None => format!("this section accepts: {known_keys}"),
    }
}

/// Declared keys for a section; the section names themselves for the
/// top level. Unknown sections get an empty slice.
pub fn known_fields(section: Option<&str>) -> &'static [&'static str] {
    match section {
        None => SECTION_NAMES,
        Some(name) => SECTION_FIELDS
            .iter()
            .find(|(s, _)| *s == name)
            .map(|(_, fields)| *fields)
            .unwrap_or(&[]),
    }
}

/// Convert a figment extraction failure into `ConfigError` diagnostics,
/// one per underlying error, with suggestions and source spans attached
/// where the offending TOML file is available.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let section = error.path.first().map(|s| s.to_string());
                // figment reports the declared keys for structs; fall back
                // to the static table when it cannot.
                let declared: Vec<&str> = if expected.is_empty() {
                    known_fields(section.as_deref()).to_vec()
                } else {
                    expected.to_vec()
                };
                let suggestion = suggest_key(field, &declared);
                let (span, src) = attach_source(&error, section.as_deref(), field, toml_sources);
                ConfigError::UnrecognizedKey {
                    key_path: match &section {
                        Some(s) => format!("{s}.{field}"),
                        None => field.clone(),
                    },
                    suggestion,
                    known_keys: declared.join(", "),
                    span,
                    src,
                }
            }
            Kind::InvalidType(found, expected) => {
                let path: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
                let field = path.last().cloned().unwrap_or_default();
                let section = if path.len() > 1 {
                    Some(path[0].as_str())
                } else {
                    None
                };
                let (span, src) = attach_source(&error, section, &field, toml_sources);
                ConfigError::InvalidType {
                    key_path: path.join("."),
                    found: found.to_string(),
                    expected: expected.to_string(),
                    span,
                    src,
                }
            }
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Resolve the span of `field` in whichever loaded TOML file produced the
/// error. Errors from non-file providers (env vars, inline strings) carry
/// no span.
fn attach_source(
    error: &figment::error::Error,
    section: Option<&str>,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let path = match error.metadata.as_ref().and_then(|m| m.source.as_ref()) {
        Some(figment::Source::File(path)) => path.display().to_string(),
        _ => return (None, None),
    };
    let Some((name, content)) = toml_sources.iter().find(|(p, _)| *p == path) else {
        return (None, None);
    };
    match locate_key(content, section, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(name, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` in `content`, restricted to the named section.
///
/// Tracks `[section]` headers line by line, so a field that also appears
/// under an earlier section (common here: `api_key` exists in three
/// sections) is not mismatched. `section = None` searches only the
/// top-level keys before the first header.
pub fn locate_key(content: &str, section: Option<&str>, field: &str) -> Option<usize> {
    let mut offset = 0;
    let mut in_section = section.is_none();

    for line in content.lines() {
        let trimmed = line.trim_start();
        if let Some(header) = trimmed.strip_prefix('[') {
            let name = header.trim_end().trim_end_matches(']');
            in_section = section == Some(name);
        } else if in_section {
            if let Some(rest) = trimmed.strip_prefix(field) {
                if rest.trim_start().starts_with('=') {
                    return Some(offset + (line.len() - trimmed.len()));
                }
            }
        }
        offset += line.len() + 1;
    }

    None
}

/// Closest candidate to `unknown` by Jaro-Winkler similarity, if any
/// clears the suggestion threshold.
pub fn suggest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|key| (*key, strsim::jaro_winkler(unknown, key)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(key, _)| key.to_string())
}

/// Render diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("config error: {error}"),
        }
    }
}
