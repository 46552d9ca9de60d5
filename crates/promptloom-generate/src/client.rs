// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the completion service that writes the final prompt.
//!
//! Speaks a Straico-shaped completion API. The envelope has shipped in two
//! forms: a single `data.completion` and a per-model `data.completions`
//! map; both are probed. Upstream failures are soft by contract: the client
//! warns and returns an empty string so the orchestrator can fall back.

use std::time::Duration;

use async_trait::async_trait;
use promptloom_core::{
    AdapterType, GenerationInstruction, HealthStatus, PluginAdapter, PromptGenerator,
    PromptloomError,
};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

/// HTTP client implementing the [`PromptGenerator`] trait.
pub struct CompletionClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl CompletionClient {
    /// Creates a new completion client. A missing API key is a hard
    /// configuration failure.
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
        request_timeout: Duration,
    ) -> Result<Self, PromptloomError> {
        let api_key = api_key.ok_or_else(|| {
            PromptloomError::ConfigurationMissing("generation.api_key".to_string())
        })?;

        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        let value = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            PromptloomError::ConfigurationMissing(format!("invalid generation API key: {e}"))
        })?;
        headers.insert("authorization", value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()
            .map_err(|e| PromptloomError::Upstream {
                service: "generation".into(),
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

/// Pull the completion text out of either envelope shape.
///
/// Probes `data.completion.choices[0].message.content`, then
/// `data.completions.{model}.completion.choices[0].message.content`.
pub fn extract_completion(body: &Value, model: &str) -> Option<String> {
    let data = body.get("data")?;

    let from_single = data
        .get("completion")
        .and_then(|c| choice_content(c));
    if let Some(text) = from_single {
        return Some(text);
    }

    data.get("completions")
        .and_then(|c| c.get(model))
        .and_then(|m| m.get("completion"))
        .and_then(choice_content)
}

fn choice_content(completion: &Value) -> Option<String> {
    completion
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Normalize generated text: strip markdown fences, wrapping quotes, and
/// surrounding whitespace.
pub fn clean_prompt(text: &str) -> String {
    let mut cleaned = text.trim();

    // ```...``` fences, with or without a language tag on the first line.
    if cleaned.starts_with("```") {
        cleaned = cleaned.trim_start_matches("```");
        if let Some(newline) = cleaned.find('\n') {
            let (first_line, rest) = cleaned.split_at(newline);
            if first_line.chars().all(|c| c.is_ascii_alphanumeric()) {
                cleaned = rest;
            }
        }
        cleaned = cleaned.trim_end_matches("```");
        cleaned = cleaned.trim();
    }

    // Wrapping quotes, only when they enclose the whole text.
    for quote in ['"', '\''] {
        if cleaned.len() >= 2 && cleaned.starts_with(quote) && cleaned.ends_with(quote) {
            cleaned = &cleaned[1..cleaned.len() - 1];
        }
    }

    cleaned.trim().to_string()
}

#[async_trait]
impl PromptGenerator for CompletionClient {
    async fn generate(
        &self,
        instruction: &GenerationInstruction,
    ) -> Result<String, PromptloomError> {
        let message = format!("{}\n\n{}", instruction.system, instruction.user);
        let payload = serde_json::json!({
            "models": [self.model],
            "message": message,
        });

        let response = self
            .client
            .post(format!("{}/prompt/completion", self.base_url))
            .json(&payload)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "completion request failed");
                return Ok(String::new());
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "completion request rejected");
            return Ok(String::new());
        }

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "completion response was not JSON");
                return Ok(String::new());
            }
        };

        match extract_completion(&body, &self.model) {
            Some(raw) => {
                let prompt = clean_prompt(&raw);
                debug!(chars = prompt.len(), "completion extracted");
                Ok(prompt)
            }
            None => {
                warn!("completion response had no recognizable envelope");
                Ok(String::new())
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for CompletionClient {
    fn name(&self) -> &str {
        "completion-http"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generation
    }

    async fn health_check(&self) -> Result<HealthStatus, PromptloomError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .send()
            .await;
        match response {
            Ok(r) if r.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(r) => Ok(HealthStatus::Degraded(format!(
                "models endpoint returned {}",
                r.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("unreachable: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), PromptloomError> {
        Ok(())
    }
}
