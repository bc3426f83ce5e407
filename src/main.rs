//! Weekly QA report - main entry point.
//!
//! Loads configuration, builds the Google Sheets and Slack clients, and runs
//! one report end-to-end.

mod config;
mod error;
mod models;
mod services;

use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::config::{Config, GOOGLE_CREDENTIALS_VAR, SLACK_TOKEN_VAR};
use crate::services::{SheetsClient, SlackClient, WeeklyReport};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration - fatal before any collaborator call
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - {} must hold the service-account JSON", GOOGLE_CREDENTIALS_VAR);
            error!("  - {} must hold the Slack bot token", SLACK_TOKEN_VAR);
            return std::process::ExitCode::FAILURE;
        }
    };

    info!("Starting weekly QA report...");

    // Initialize clients - malformed credentials are also a startup failure
    let sheets = match SheetsClient::new(
        &config.google_credentials,
        config.report.spreadsheet_id.clone(),
    ) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initialize clients: {}", e);
            return std::process::ExitCode::FAILURE;
        }
    };
    let slack = match SlackClient::new(config.slack_token) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initialize clients: {}", e);
            return std::process::ExitCode::FAILURE;
        }
    };
    info!("Clients initialized");

    let report = WeeklyReport::new(&config.report, &sheets, &slack, &slack);
    match report.run().await {
        Ok(true) => {
            info!("Report completed!");
            std::process::ExitCode::SUCCESS
        }
        Ok(false) => {
            // The digest was built but not delivered; the run itself is done.
            warn!("Report completed, but the digest could not be posted");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Report run failed: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}
