//! relnotes CLI
//!
//! Command-line interface for changelog linting, querying, and preview.

#![forbid(unsafe_code)]

use anyhow::{Context as _, Result};
use clap::Parser;
use relnotes_cli::{Cli, Commands, Context, logging, run};
use relnotes_core::{ConfigManager, RelnotesConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config commands must work even when the config file is broken.
    let config = match &cli.command {
        Commands::Config { .. } => RelnotesConfig::load(cli.config.as_deref()).unwrap_or_default(),
        _ => RelnotesConfig::load(cli.config.as_deref()).context("Failed to load configuration")?,
    };

    logging::init(cli.verbose, cli.quiet, &config.log_level);
    tracing::debug!(?config, "Loaded configuration");

    let ctx = Context::new(config, cli.config, cli.changelog);
    run(cli.command, &ctx).await?;
    Ok(())
}
