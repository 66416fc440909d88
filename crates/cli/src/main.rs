//! Agentic Patterns CLI: the main entry point.
//!
//! Commands:
//! - `reflect`: Run the generate → reflect loop on a request
//! - `config`: Show the effective configuration or write a default one
//! - `models`: List the models a provider serves

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod console;

#[derive(Parser)]
#[command(
    name = "agentic-patterns",
    about = "Agentic Patterns: an LLM that critiques and revises its own output",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (defaults to ~/.agentic-patterns/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a response and refine it through self-critique
    Reflect(commands::reflect::ReflectArgs),

    /// Show the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },

    /// List the models served by a provider
    Models {
        /// Provider name (defaults to the configured provider)
        #[arg(short, long)]
        provider: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing on stderr; stdout carries the agent's output
    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Reflect(args) => commands::reflect::run(config_path, args).await?,
        Commands::Config { init } => commands::config_cmd::run(config_path, init).await?,
        Commands::Models { provider } => commands::models::run(config_path, provider).await?,
    }

    Ok(())
}
