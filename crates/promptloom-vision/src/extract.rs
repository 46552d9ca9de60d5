// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response-shape extraction for vision analysis payloads.
//!
//! The upstream service has shipped several response shapes over time: a
//! flat object, a `structured_analysis` nesting, `result`/`data` wrappers,
//! and a markdown-fenced JSON blob inside a description string. Extraction
//! runs an ordered list of pure strategies over the payload; the first one
//! that yields a non-empty analysis wins. Adding a new shape means adding
//! one strategy, not touching the others.

use promptloom_core::AnalysisResult;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

type Strategy = fn(&Value) -> Option<AnalysisResult>;

/// Strategies in priority order. Fenced descriptions are checked before the
/// flat shape so a fence inside `description` is parsed rather than kept as
/// literal text.
const STRATEGIES: &[Strategy] = &[
    extract_fenced_description,
    extract_flat,
    extract_structured,
    extract_wrapped,
];

/// Extract a normalized analysis from an arbitrary response payload.
///
/// Returns `None` when no strategy recognizes the shape or every candidate
/// analysis is empty.
pub fn extract(value: &Value) -> Option<AnalysisResult> {
    STRATEGIES.iter().find_map(|strategy| strategy(value))
}

/// Flat shape: the analysis fields sit directly on the object.
fn extract_flat(value: &Value) -> Option<AnalysisResult> {
    let obj = value.as_object()?;
    let result = AnalysisResult {
        short_description: obj
            .get("short_description")
            .or_else(|| obj.get("description"))
            .and_then(flatten_text),
        mood: obj.get("mood").and_then(flatten_text),
        lighting: obj.get("lighting").and_then(flatten_text),
        colors: obj.get("colors").map(flatten_colors).unwrap_or_default(),
        tags: obj.get("tags").map(flatten_tags).unwrap_or_default(),
    };
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

/// Nested shape: fields live under a `structured_analysis` key.
fn extract_structured(value: &Value) -> Option<AnalysisResult> {
    extract_flat(value.get("structured_analysis")?)
}

/// Wrapper shapes: the payload is inside `result` or `data`. Recurses so
/// wrapped payloads can themselves be structured or fenced.
fn extract_wrapped(value: &Value) -> Option<AnalysisResult> {
    for key in ["result", "data", "analysis"] {
        if let Some(inner) = value.get(key) {
            if let Some(result) = extract(inner) {
                return Some(result);
            }
        }
    }
    None
}

/// Fenced shape: a `description` string (or a bare string payload) holding a
/// ```json block. A parse failure keeps the raw text as the description
/// rather than discarding it. Descriptions without a fence fall through to
/// the flat strategy.
fn extract_fenced_description(value: &Value) -> Option<AnalysisResult> {
    let text = value
        .as_str()
        .or_else(|| value.get("description").and_then(Value::as_str))?;

    if let Some(json_body) = strip_json_fence(text) {
        if let Ok(inner) = serde_json::from_str::<Value>(&json_body) {
            if let Some(result) = extract_flat(&inner) {
                return Some(result);
            }
        }
        // Fence present but unusable: keep the surrounding text.
        return text_description(text);
    }

    if value.is_string() {
        return text_description(text);
    }
    None
}

fn text_description(text: &str) -> Option<AnalysisResult> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(AnalysisResult {
        short_description: Some(trimmed.to_string()),
        ..Default::default()
    })
}

/// Pull the body out of a markdown ```json fence, if the text carries one.
pub fn strip_json_fence(text: &str) -> Option<String> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let re = FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fence regex is valid")
    });
    re.captures(text).map(|c| c[1].to_string())
}

/// Flatten a mood/lighting/description value to a plain string.
///
/// Accepts a string, an object (preferring summary-like keys, else the
/// first string value), or an array of strings joined with ", ".
fn flatten_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Object(map) => {
            for key in ["overall", "description", "summary", "value"] {
                if let Some(Value::String(s)) = map.get(key) {
                    if !s.trim().is_empty() {
                        return Some(s.trim().to_string());
                    }
                }
            }
            map.values().find_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
        }
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}

/// Colors arrive as plain strings or `{hex, name}` objects.
fn flatten_colors(value: &Value) -> Vec<String> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map
                .get("hex")
                .or_else(|| map.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .collect()
}

fn flatten_tags(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_flat_shape() {
        let payload = json!({
            "short_description": "a foggy mountain pass",
            "mood": "serene",
            "lighting": "overcast",
            "colors": ["#aabbcc", "gray"],
            "tags": ["mountain", "fog"]
        });
        let result = extract(&payload).unwrap();
        assert_eq!(result.short_description.as_deref(), Some("a foggy mountain pass"));
        assert_eq!(result.mood.as_deref(), Some("serene"));
        assert_eq!(result.colors, vec!["#aabbcc", "gray"]);
        assert_eq!(result.tags, vec!["mountain", "fog"]);
    }

    #[test]
    fn extracts_structured_analysis_nesting() {
        let payload = json!({
            "status": "completed",
            "structured_analysis": {
                "description": "neon city street",
                "mood": {"overall": "energetic", "secondary": "tense"},
                "lighting": {"description": "neon glow"},
                "colors": [{"hex": "#ff00ff"}, {"name": "cyan"}],
                "tags": ["city", "night"]
            }
        });
        let result = extract(&payload).unwrap();
        assert_eq!(result.short_description.as_deref(), Some("neon city street"));
        assert_eq!(result.mood.as_deref(), Some("energetic"));
        assert_eq!(result.lighting.as_deref(), Some("neon glow"));
        assert_eq!(result.colors, vec!["#ff00ff", "cyan"]);
    }

    #[test]
    fn extracts_result_wrapper() {
        let payload = json!({
            "result": {"description": "a red apple", "tags": ["fruit"]}
        });
        let result = extract(&payload).unwrap();
        assert_eq!(result.short_description.as_deref(), Some("a red apple"));
    }

    #[test]
    fn extracts_data_wrapper_with_nested_structured() {
        let payload = json!({
            "data": {
                "structured_analysis": {"mood": "calm"}
            }
        });
        let result = extract(&payload).unwrap();
        assert_eq!(result.mood.as_deref(), Some("calm"));
    }

    #[test]
    fn extracts_fenced_json_description() {
        let payload = json!({
            "description": "```json\n{\"short_description\": \"glass skyscraper\", \"tags\": [\"architecture\"]}\n```"
        });
        let result = extract(&payload).unwrap();
        assert_eq!(result.short_description.as_deref(), Some("glass skyscraper"));
        assert_eq!(result.tags, vec!["architecture"]);
    }

    #[test]
    fn malformed_fenced_json_falls_back_to_raw_text() {
        let payload = json!({
            "description": "```json\n{not valid json}\n```"
        });
        let result = extract(&payload).unwrap();
        assert!(result
            .short_description
            .as_deref()
            .unwrap()
            .contains("not valid json"));
    }

    #[test]
    fn mood_array_is_joined() {
        let payload = json!({"mood": ["moody", "dark"]});
        let result = extract(&payload).unwrap();
        assert_eq!(result.mood.as_deref(), Some("moody, dark"));
    }

    #[test]
    fn bare_string_payload_becomes_description() {
        let result = extract(&json!("a hand-drawn map")).unwrap();
        assert_eq!(result.short_description.as_deref(), Some("a hand-drawn map"));
    }

    #[test]
    fn plain_description_with_mood_uses_flat_shape() {
        let payload = json!({"description": "a red apple", "mood": "fresh"});
        let result = extract(&payload).unwrap();
        assert_eq!(result.short_description.as_deref(), Some("a red apple"));
        assert_eq!(result.mood.as_deref(), Some("fresh"));
    }

    #[test]
    fn unrecognized_shape_yields_none() {
        assert!(extract(&json!({"status": "pending", "task_id": "t1"})).is_none());
        assert!(extract(&json!(42)).is_none());
        assert!(extract(&json!({})).is_none());
    }
}
