mod cli;
mod commands;
mod document;
mod observability;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use tagsync_config::load_config;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing_with_level(&cli.log_level);

    let format = cli.format.unwrap_or_default();
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    match &cli.command {
        Commands::Plan(args) => commands::plan::plan(&config, args, format)?,
        Commands::Services => commands::services::list(&config, format)?,
        Commands::Rehearse(args) => commands::rehearse::rehearse(&config, args, format).await?,
    }

    Ok(())
}
