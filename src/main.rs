mod app;
mod audio;
mod config;
mod controller;
mod input;
mod messages;
mod playback;
mod selection;
mod services;
mod shortcuts;
mod ui;
mod upload;

use app::App;
use config::Config;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Photograph-and-ask client: record a question about an image and hear the answer
#[derive(Parser)]
#[command(name = "envisonet", version)]
struct Cli {
    /// Config file (default: ~/.config/envisonet/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the server base URL from the config file
    #[arg(long)]
    server_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    tracing::info!("Starting envisonet client");

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(server_url) = cli.server_url {
        config.server_url = server_url;
    }
    config.validate()?;

    // Create LocalSet for !Send futures (needed for Recorder which holds cpal::Stream)
    let local = tokio::task::LocalSet::new();

    local.run_until(async move { run_app(config).await }).await
}

async fn run_app(config: Config) -> Result<()> {
    let app = App::new(config)?;

    tokio::select! {
        result = app.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
    }

    tracing::info!("envisonet shutdown complete");
    Ok(())
}
