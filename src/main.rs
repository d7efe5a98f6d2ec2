//! Soundscape CLI - Layered Audio Timeline Player
//!
//! Command-line interface for the soundscape sequencer.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use soundscape::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    info!("Soundscape v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Validate { config, lenient } => commands::validate(&config, lenient)
            .with_context(|| format!("invalid configuration {}", config.display())),
        Commands::Run(args) => commands::run(&args)
            .await
            .with_context(|| format!("failed to run {}", args.config.display())),
    }
}
