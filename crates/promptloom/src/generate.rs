// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `promptloom generate` command implementation.

use std::str::FromStr;

use clap::Args;
use promptloom_config::PromptloomConfig;
use promptloom_core::{CategoryKey, GenerationRequest, PromptloomError, RequestOrigin};

use crate::wiring::build_pipeline;

/// Arguments for one generation run.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Free text describing the desired prompt.
    #[arg(long)]
    pub text: Option<String>,

    /// Reference image URL. May be given multiple times (first five used).
    #[arg(long = "image")]
    pub images: Vec<String>,

    /// Explicit style category (e.g. anime, logo, youtube-thumbnail).
    #[arg(long)]
    pub category: Option<String>,

    /// Account id to bill and rate-limit against. Omit for a guest run.
    #[arg(long)]
    pub account: Option<String>,
}

/// Run the `promptloom generate` command and print the outcome as JSON.
pub async fn run_generate(
    config: &PromptloomConfig,
    args: GenerateArgs,
) -> Result<(), PromptloomError> {
    let category = match &args.category {
        Some(raw) => Some(CategoryKey::from_str(raw).map_err(|_| {
            PromptloomError::ConfigurationMissing(format!("unknown category `{raw}`"))
        })?),
        None => None,
    };

    let origin = if args.account.is_some() {
        RequestOrigin::Authenticated
    } else {
        RequestOrigin::Guest
    };
    let rate_limit_key = args
        .account
        .clone()
        .unwrap_or_else(|| "cli-guest".to_string());

    let request = GenerationRequest {
        text: args.text,
        image_urls: args.images,
        category,
        origin,
        rate_limit_key,
        account_id: args.account,
        progress_identity: Some(promptloom_core::new_record_id()),
    };

    let pipeline = build_pipeline(config).await?;
    let outcome = pipeline.run(&request).await?;

    let rendered = serde_json::to_string_pretty(&outcome)
        .map_err(|e| PromptloomError::Internal(format!("failed to render outcome: {e}")))?;
    println!("{rendered}");
    Ok(())
}
