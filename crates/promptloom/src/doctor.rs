// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `promptloom doctor` command implementation.
//!
//! Runs diagnostic checks against the local environment and the configured
//! external services: configuration validity, database connectivity, and a
//! health check per service adapter.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use promptloom_config::PromptloomConfig;
use promptloom_core::{HealthStatus, PluginAdapter, PromptloomError};
use promptloom_embedding::EmbeddingClient;
use promptloom_generate::CompletionClient;
use promptloom_store::Database;
use promptloom_vision::VisionClient;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// Check status.
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    /// Duration the check took.
    pub duration: Duration,
}

/// Run the `promptloom doctor` command.
///
/// With `--plain`, disables colored output.
pub async fn run_doctor(config: &PromptloomConfig, plain: bool) -> Result<(), PromptloomError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_config().await,
        check_database(config).await,
        check_vision(config).await,
        check_embedding(config).await,
        check_generation(config).await,
    ];

    println!();
    println!("  promptloom doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;

    for result in &results {
        let duration_ms = result.duration.as_millis();
        let line = match result.status {
            CheckStatus::Pass => {
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<16} {} ({duration_ms}ms)",
                        "✓".green(),
                        result.name,
                        result.message
                    )
                } else {
                    format!(
                        "    [OK]   {:<16} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
            CheckStatus::Warn => {
                warn_count += 1;
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<16} {} ({duration_ms}ms)",
                        "!".yellow(),
                        result.name,
                        result.message.yellow()
                    )
                } else {
                    format!(
                        "    [WARN] {:<16} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
            CheckStatus::Fail => {
                fail_count += 1;
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<16} {} ({duration_ms}ms)",
                        "✗".red(),
                        result.name,
                        result.message.red()
                    )
                } else {
                    format!(
                        "    [FAIL] {:<16} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
        };
        println!("{line}");
    }

    println!();
    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

/// Check configuration loads without errors.
async fn check_config() -> CheckResult {
    let start = Instant::now();
    match promptloom_config::load_and_validate() {
        Ok(_) => CheckResult {
            name: "Configuration".to_string(),
            status: CheckStatus::Pass,
            message: "valid".to_string(),
            duration: start.elapsed(),
        },
        Err(errors) => CheckResult {
            name: "Configuration".to_string(),
            status: CheckStatus::Fail,
            message: format!("{} error(s)", errors.len()),
            duration: start.elapsed(),
        },
    }
}

/// Check the database opens, migrates, and answers a trivial query.
async fn check_database(config: &PromptloomConfig) -> CheckResult {
    let start = Instant::now();
    match Database::open(&config.storage.database_path, config.storage.wal_mode).await {
        Ok(db) => match db.ping().await {
            Ok(()) => CheckResult {
                name: "Database".to_string(),
                status: CheckStatus::Pass,
                message: "connected".to_string(),
                duration: start.elapsed(),
            },
            Err(e) => CheckResult {
                name: "Database".to_string(),
                status: CheckStatus::Fail,
                message: format!("query failed: {e}"),
                duration: start.elapsed(),
            },
        },
        Err(e) => CheckResult {
            name: "Database".to_string(),
            status: CheckStatus::Fail,
            message: format!("open failed: {e}"),
            duration: start.elapsed(),
        },
    }
}

/// Check the vision service, when one is configured.
async fn check_vision(config: &PromptloomConfig) -> CheckResult {
    let start = Instant::now();
    let Some(base_url) = &config.vision.base_url else {
        return CheckResult {
            name: "Vision API".to_string(),
            status: CheckStatus::Warn,
            message: "not configured".to_string(),
            duration: start.elapsed(),
        };
    };

    let client = VisionClient::new(
        base_url.clone(),
        config.vision.api_key.clone(),
        Duration::from_secs(config.vision.poll_interval_secs),
        config.vision.max_poll_attempts,
        Duration::from_secs(5),
    );
    match client {
        Ok(client) => health_to_check("Vision API", client.health_check().await, start),
        Err(e) => CheckResult {
            name: "Vision API".to_string(),
            status: CheckStatus::Fail,
            message: e.to_string(),
            duration: start.elapsed(),
        },
    }
}

/// Check the embedding service round-trips a request.
async fn check_embedding(config: &PromptloomConfig) -> CheckResult {
    let start = Instant::now();
    if config.embedding.api_key.is_none() {
        return CheckResult {
            name: "Embedding API".to_string(),
            status: CheckStatus::Warn,
            message: "no API key configured".to_string(),
            duration: start.elapsed(),
        };
    }

    let client = EmbeddingClient::new(
        config.embedding.base_url.clone(),
        config.embedding.api_key.clone(),
        config.embedding.model.clone(),
        config.embedding.max_input_chars,
    );
    match client {
        Ok(client) => health_to_check("Embedding API", client.health_check().await, start),
        Err(e) => CheckResult {
            name: "Embedding API".to_string(),
            status: CheckStatus::Fail,
            message: e.to_string(),
            duration: start.elapsed(),
        },
    }
}

/// Check the completion service is reachable.
async fn check_generation(config: &PromptloomConfig) -> CheckResult {
    let start = Instant::now();
    if config.generation.api_key.is_none() {
        return CheckResult {
            name: "Generation API".to_string(),
            status: CheckStatus::Warn,
            message: "no API key configured".to_string(),
            duration: start.elapsed(),
        };
    }

    let client = CompletionClient::new(
        config.generation.base_url.clone(),
        config.generation.api_key.clone(),
        config.generation.model.clone(),
        Duration::from_secs(5),
    );
    match client {
        Ok(client) => health_to_check("Generation API", client.health_check().await, start),
        Err(e) => CheckResult {
            name: "Generation API".to_string(),
            status: CheckStatus::Fail,
            message: e.to_string(),
            duration: start.elapsed(),
        },
    }
}

fn health_to_check(
    name: &str,
    health: Result<HealthStatus, PromptloomError>,
    start: Instant,
) -> CheckResult {
    let (status, message) = match health {
        Ok(HealthStatus::Healthy) => (CheckStatus::Pass, "healthy".to_string()),
        Ok(HealthStatus::Degraded(msg)) => (CheckStatus::Warn, msg),
        Ok(HealthStatus::Unhealthy(msg)) => (CheckStatus::Fail, msg),
        Err(e) => (CheckStatus::Fail, e.to_string()),
    };
    CheckResult {
        name: name.to_string(),
        status,
        message,
        duration: start.elapsed(),
    }
}
