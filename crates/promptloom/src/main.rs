// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Promptloom - retrieval-augmented prompt generation.
//!
//! This is the binary entry point for the Promptloom CLI.

mod doctor;
mod generate;
mod wiring;

use clap::{Parser, Subcommand};
use promptloom_config::PromptloomConfig;

/// Promptloom - retrieval-augmented prompt generation.
#[derive(Parser, Debug)]
#[command(name = "promptloom", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a prompt from text and/or reference images.
    Generate(generate::GenerateArgs),
    /// Run diagnostic checks against the environment and services.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match promptloom_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            promptloom_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.pipeline.log_level);

    let result = match cli.command {
        Commands::Generate(args) => generate::run_generate(&config, args).await,
        Commands::Doctor { plain } => doctor::run_doctor(&config, plain).await,
        Commands::Config => render_config(&config),
    };

    if let Err(err) = result {
        eprintln!("promptloom: {err}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("promptloom={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

/// Prints the effective configuration as TOML, with API keys masked.
fn render_config(config: &PromptloomConfig) -> Result<(), promptloom_core::PromptloomError> {
    let mut masked = config.clone();
    masked.vision.api_key = masked.vision.api_key.map(|_| "***".to_string());
    masked.embedding.api_key = masked.embedding.api_key.map(|_| "***".to_string());
    masked.generation.api_key = masked.generation.api_key.map(|_| "***".to_string());

    let rendered = toml::to_string_pretty(&masked).map_err(|e| {
        promptloom_core::PromptloomError::Internal(format!("failed to render config: {e}"))
    })?;
    print!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = promptloom_config::load_and_validate()
            .expect("default config should be valid");
        assert_eq!(config.limits.guest_per_minute, 1);
        assert_eq!(config.embedding.dimensions, 768);
    }

    #[test]
    fn rendered_config_masks_api_keys() {
        let mut config = PromptloomConfig::default();
        config.embedding.api_key = Some("super-secret".into());
        let mut masked = config.clone();
        masked.embedding.api_key = masked.embedding.api_key.map(|_| "***".to_string());
        let rendered = toml::to_string_pretty(&masked).unwrap();
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("***"));
    }
}
