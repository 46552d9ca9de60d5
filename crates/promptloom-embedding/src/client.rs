// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the text embedding API.
//!
//! Speaks the Google Generative Language `:embedContent` shape: POST to
//! `models/{model}:embedContent` with the key as a query parameter, reading
//! the vector from `embedding.values`.

use std::time::Duration;

use async_trait::async_trait;
use promptloom_core::{
    AdapterType, Embedder, HealthStatus, PluginAdapter, PromptloomError, EMBEDDING_DIMENSIONS,
};
use serde_json::Value;
use tracing::debug;

/// HTTP client implementing the [`Embedder`] trait.
pub struct EmbeddingClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_input_chars: usize,
}

impl EmbeddingClient {
    /// Creates a new embedding client. A missing API key is a hard
    /// configuration failure; the pipeline cannot search without embeddings
    /// configured, even though individual embed calls may still degrade.
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
        max_input_chars: usize,
    ) -> Result<Self, PromptloomError> {
        let api_key = api_key.ok_or_else(|| {
            PromptloomError::ConfigurationMissing("embedding.api_key".to_string())
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PromptloomError::Upstream {
                service: "embedding".into(),
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            max_input_chars,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:embedContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    /// Truncates input to the configured character budget on a char
    /// boundary.
    fn truncate(&self, text: &str) -> String {
        text.chars().take(self.max_input_chars).collect()
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PromptloomError> {
        let input = self.truncate(text);
        let payload = serde_json::json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [{ "text": input }] }
        });

        let response = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|e| PromptloomError::Upstream {
                service: "embedding".into(),
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PromptloomError::upstream(
                "embedding",
                format!("API returned {status}: {body}"),
            ));
        }

        let body: Value = response.json().await.map_err(|e| PromptloomError::Upstream {
            service: "embedding".into(),
            message: format!("failed to parse API response: {e}"),
            source: Some(Box::new(e)),
        })?;

        let values = body
            .get("embedding")
            .and_then(|e| e.get("values"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                PromptloomError::upstream("embedding", "response missing embedding.values")
            })?;

        let vector: Vec<f32> = values
            .iter()
            .filter_map(Value::as_f64)
            .map(|v| v as f32)
            .collect();

        if vector.len() != EMBEDDING_DIMENSIONS {
            return Err(PromptloomError::upstream(
                "embedding",
                format!(
                    "expected {EMBEDDING_DIMENSIONS} dimensions, got {}",
                    vector.len()
                ),
            ));
        }

        debug!(dims = vector.len(), "embedding generated");
        Ok(vector)
    }
}

#[async_trait]
impl PluginAdapter for EmbeddingClient {
    fn name(&self) -> &str {
        "embedding-http"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, PromptloomError> {
        // A minimal embed exercises auth and the endpoint in one call.
        match self.embed("health check").await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), PromptloomError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn vector_body(dims: usize) -> serde_json::Value {
        let values: Vec<f64> = (0..dims).map(|i| i as f64 / dims as f64).collect();
        serde_json::json!({ "embedding": { "values": values } })
    }

    fn test_client(base_url: &str) -> EmbeddingClient {
        EmbeddingClient::new(
            base_url.to_string(),
            Some("ek-test".into()),
            "text-embedding-004".into(),
            2000,
        )
        .unwrap()
    }

    #[test]
    fn missing_api_key_fails_construction() {
        let result = EmbeddingClient::new(
            "https://example.com".into(),
            None,
            "text-embedding-004".into(),
            2000,
        );
        assert!(matches!(
            result,
            Err(PromptloomError::ConfigurationMissing(key)) if key.contains("api_key")
        ));
    }

    #[tokio::test]
    async fn embeds_text_with_key_as_query_param() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:embedContent"))
            .and(query_param("key", "ek-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vector_body(768)))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let vector = client.embed("a foggy mountain pass").await.unwrap();
        assert_eq!(vector.len(), 768);
    }

    #[tokio::test]
    async fn input_is_truncated_to_char_budget() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:embedContent"))
            .respond_with(move |req: &Request| {
                let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
                let text = body["content"]["parts"][0]["text"].as_str().unwrap();
                assert_eq!(text.chars().count(), 2000);
                ResponseTemplate::new(200).set_body_json(vector_body(768))
            })
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let long_input = "x".repeat(5000);
        client.embed(&long_input).await.unwrap();
    }

    #[tokio::test]
    async fn wrong_dimensionality_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:embedContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vector_body(512)))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.embed("short text").await.unwrap_err();
        assert!(err.to_string().contains("768"), "got: {err}");
    }

    #[tokio::test]
    async fn non_success_status_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:embedContent"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.embed("short text").await.unwrap_err();
        assert!(matches!(err, PromptloomError::Upstream { .. }));
    }
}
