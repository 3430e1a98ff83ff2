mod api;
#[cfg(feature = "cli")]
mod cli;
mod config;
mod dispatch;
mod files;
mod logging;
mod models;
mod selection;
#[cfg(test)]
mod testing;
mod ui;

use anyhow::{Context, Result};
use config::Config;
use ui::App;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;
    logging::init(&config.log_file)?;
    tracing::info!(api_url = %config.api_url, "starting");

    // Initialize API client
    let canvas_client = api::CanvasClient::new(config.api_url, config.access_token)?;

    #[cfg(feature = "cli")]
    {
        use clap::Parser;
        let args = cli::Args::parse();
        if args.is_headless() {
            return cli::run_headless(&canvas_client, args).await;
        }
    }

    // Start TUI application
    let mut app = App::new(canvas_client);
    app.run().await?;

    Ok(())
}
