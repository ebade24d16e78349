mod cli;
mod commands;
mod observability;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use idgate_auth::load_config;

#[tokio::main]
async fn main() {
    // Load .env file if present; a missing file is not an error.
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing_with_level(&cli.log_level);

    let config = load_config(cli.config.as_deref())?;
    tracing::info!(issuer = %config.issuer, "Configuration loaded");

    let keys = Arc::new(commands::load_key_provider(
        &config,
        cli.signing_key.as_deref(),
    )?);

    let output = match &cli.command {
        Commands::Keys => commands::keys(keys.as_ref()).await?,
        Commands::Demo(args) => commands::demo(&config, keys, args).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
