// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the vision analysis service.
//!
//! Submits an image URL for analysis and, when the service answers with a
//! polling handle instead of a result, polls for completion on a bounded
//! schedule. Every failure mode degrades to `Ok(None)`; the pipeline treats
//! a missing analysis as reduced context, not an error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use promptloom_core::{
    AdapterType, AnalysisResult, HealthStatus, PluginAdapter, PromptloomError, VisionAnalyzer,
};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use crate::clock::{Clock, TokioClock};
use crate::extract;

/// Statuses that mean the analysis is still in flight.
const PENDING_STATUSES: &[&str] = &["pending", "processing", "queued", "in_progress"];

/// HTTP client for vision analysis with bounded result polling.
pub struct VisionClient {
    client: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
    clock: Arc<dyn Clock>,
}

impl VisionClient {
    /// Creates a new vision client.
    ///
    /// `api_key`, when present, is sent as a bearer token on every request.
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        poll_interval: Duration,
        max_poll_attempts: u32,
        request_timeout: Duration,
    ) -> Result<Self, PromptloomError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                PromptloomError::ConfigurationMissing(format!("invalid vision API key: {e}"))
            })?;
            headers.insert("authorization", value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()
            .map_err(|e| PromptloomError::Upstream {
                service: "vision".into(),
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_interval,
            max_poll_attempts,
            clock: Arc::new(TokioClock),
        })
    }

    /// Replaces the polling clock (for tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Submits the analysis request and resolves it to a payload, polling
    /// when the service responds asynchronously.
    async fn fetch_analysis(&self, image_url: &str) -> Option<Value> {
        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .json(&serde_json::json!({ "image_url": image_url }))
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "vision analysis request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "vision analysis request rejected");
            return None;
        }

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "vision analysis response was not JSON");
                return None;
            }
        };

        match poll_handle(&body) {
            Some(handle) => self.poll_for_result(&handle).await,
            None => Some(body),
        }
    }

    /// Polls `GET {base}/results/{handle}` until the analysis completes or
    /// the attempt budget is exhausted. Exhaustion is a silent timeout.
    async fn poll_for_result(&self, handle: &str) -> Option<Value> {
        for attempt in 1..=self.max_poll_attempts {
            self.clock.sleep(self.poll_interval).await;

            let response = self
                .client
                .get(format!("{}/results/{handle}", self.base_url))
                .send()
                .await;

            let body: Value = match response {
                Ok(r) if r.status().is_success() => match r.json().await {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(error = %e, attempt, "vision poll response was not JSON");
                        return None;
                    }
                },
                Ok(r) => {
                    warn!(status = %r.status(), attempt, "vision poll rejected");
                    return None;
                }
                Err(e) => {
                    warn!(error = %e, attempt, "vision poll request failed");
                    return None;
                }
            };

            if is_pending(&body) {
                debug!(attempt, handle, "vision analysis still pending");
                continue;
            }

            return Some(body);
        }

        warn!(
            handle,
            attempts = self.max_poll_attempts,
            "vision analysis poll budget exhausted"
        );
        None
    }
}

/// A handle for asynchronous processing, when the response carries one
/// alongside a pending status.
fn poll_handle(body: &Value) -> Option<String> {
    if !is_pending(body) {
        return None;
    }
    for key in ["analysis_id", "task_id", "id"] {
        if let Some(handle) = body.get(key).and_then(Value::as_str) {
            return Some(handle.to_string());
        }
    }
    None
}

fn is_pending(body: &Value) -> bool {
    body.get("status")
        .and_then(Value::as_str)
        .map(|s| PENDING_STATUSES.contains(&s))
        .unwrap_or(false)
}

#[async_trait]
impl VisionAnalyzer for VisionClient {
    async fn analyze(&self, image_url: &str) -> Result<Option<AnalysisResult>, PromptloomError> {
        let Some(payload) = self.fetch_analysis(image_url).await else {
            return Ok(None);
        };

        match extract::extract(&payload) {
            Some(result) => {
                debug!(image_url, "vision analysis extracted");
                Ok(Some(result))
            }
            None => {
                warn!(image_url, "vision analysis payload had no recognizable shape");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for VisionClient {
    fn name(&self) -> &str {
        "vision-http"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Vision
    }

    async fn health_check(&self) -> Result<HealthStatus, PromptloomError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await;
        match response {
            Ok(r) if r.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(r) => Ok(HealthStatus::Degraded(format!(
                "health endpoint returned {}",
                r.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("unreachable: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), PromptloomError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Clock that returns immediately and counts sleeps.
    struct CountingClock {
        sleeps: AtomicU32,
    }

    impl CountingClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sleeps: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl Clock for CountingClock {
        async fn sleep(&self, _duration: Duration) {
            self.sleeps.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn test_client(base_url: &str, clock: Arc<dyn Clock>) -> VisionClient {
        VisionClient::new(
            base_url.to_string(),
            Some("vk-test".into()),
            Duration::from_secs(2),
            30,
            Duration::from_secs(5),
        )
        .unwrap()
        .with_clock(clock)
    }

    #[tokio::test]
    async fn immediate_result_needs_no_polling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "short_description": "a lighthouse at dusk",
                "tags": ["coast"]
            })))
            .mount(&server)
            .await;

        let clock = CountingClock::new();
        let client = test_client(&server.uri(), clock.clone());
        let result = client.analyze("https://img/light.jpg").await.unwrap().unwrap();
        assert_eq!(result.short_description.as_deref(), Some("a lighthouse at dusk"));
        assert_eq!(clock.sleeps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pending_response_polls_until_complete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "processing",
                "analysis_id": "an-42"
            })))
            .mount(&server)
            .await;

        // Two pending polls, then a completed payload.
        Mock::given(method("GET"))
            .and(path("/results/an-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "processing", "analysis_id": "an-42"
            })))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/results/an-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "completed",
                "structured_analysis": {"description": "a market stall", "mood": "busy"}
            })))
            .mount(&server)
            .await;

        let clock = CountingClock::new();
        let client = test_client(&server.uri(), clock.clone());
        let result = client.analyze("https://img/market.jpg").await.unwrap().unwrap();
        assert_eq!(result.short_description.as_deref(), Some("a market stall"));
        assert_eq!(clock.sleeps.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn poll_budget_is_bounded_at_thirty_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "pending",
                "task_id": "t-9"
            })))
            .mount(&server)
            .await;

        // Never completes.
        Mock::given(method("GET"))
            .and(path("/results/t-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "pending", "task_id": "t-9"
            })))
            .expect(30)
            .mount(&server)
            .await;

        let clock = CountingClock::new();
        let client = test_client(&server.uri(), clock.clone());
        let result = client.analyze("https://img/slow.jpg").await.unwrap();
        assert!(result.is_none(), "timeout must degrade to None");
        assert_eq!(clock.sleeps.load(Ordering::SeqCst), 30);
    }

    #[tokio::test]
    async fn upstream_error_degrades_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), CountingClock::new());
        let result = client.analyze("https://img/x.jpg").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn unrecognizable_payload_degrades_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"unexpected": true})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), CountingClock::new());
        let result = client.analyze("https://img/x.jpg").await.unwrap();
        assert!(result.is_none());
    }
}
