//! Application configuration loaded from environment variables.
//!
//! Secrets come from the environment; everything else is fixed report
//! configuration carried in [`ReportSettings`] and passed explicitly into the
//! reporting components so the core stays testable without any credentials.

use std::env;

use secrecy::SecretString;

/// Environment variable holding the Google service-account JSON blob.
pub const GOOGLE_CREDENTIALS_VAR: &str = "GOOGLE_CREDENTIALS_JSON";

/// Environment variable holding the Slack bot token.
pub const SLACK_TOKEN_VAR: &str = "SLACK_BOT_TOKEN";

/// Fixed report configuration values.
pub mod defaults {
    /// Bug-tracker spreadsheet.
    pub const SPREADSHEET_ID: &str = "1u4fHAIdRckZDo9psDoJA3uVYC__aiZWmo7OlZpJctRc";

    /// Bug categories, one worksheet each. Breakdown lines render in this order.
    pub const CATEGORIES: &[&str] = &[
        "Tournaments",
        "Loyalty Program",
        "Rakeback",
        "Secretbox",
        "Boosters",
        "Widget Settings",
        "Media Library",
    ];

    /// Column holding the report date in each worksheet.
    pub const DATE_COLUMN: &str = "Date";

    /// Channel carrying automated test-run status messages.
    pub const RESULTS_CHANNEL: &str = "#gamification-test-runs";

    /// Channel the weekly digest is posted to.
    pub const DIGEST_CHANNEL: &str = "#gamification-qa-metrics";

    /// Trailing report window, in days.
    pub const WINDOW_DAYS: i64 = 7;

    /// Maximum channel messages fetched per run (single page, no paging).
    pub const HISTORY_LIMIT: u32 = 200;
}

/// Report configuration passed into the reporting components.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    /// Bug-tracker spreadsheet id
    pub spreadsheet_id: String,
    /// Ordered category (worksheet) names
    pub categories: Vec<String>,
    /// Date column name in each worksheet
    pub date_column: String,
    /// Channel to read test-run status messages from
    pub results_channel: String,
    /// Channel to post the digest to
    pub digest_channel: String,
    /// Trailing window length in days
    pub window_days: i64,
    /// Max messages per history fetch
    pub history_limit: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            spreadsheet_id: defaults::SPREADSHEET_ID.to_string(),
            categories: defaults::CATEGORIES.iter().map(|s| s.to_string()).collect(),
            date_column: defaults::DATE_COLUMN.to_string(),
            results_channel: defaults::RESULTS_CHANNEL.to_string(),
            digest_channel: defaults::DIGEST_CHANNEL.to_string(),
            window_days: defaults::WINDOW_DAYS,
            history_limit: defaults::HISTORY_LIMIT,
        }
    }
}

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    /// Google service-account credentials JSON
    pub google_credentials: SecretString,
    /// Slack bot token
    pub slack_token: SecretString,
    /// Fixed report configuration
    pub report: ReportSettings,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Both secrets are required; every missing variable is reported in one
    /// error so the operator fixes the environment in a single pass.
    ///
    /// Environment variables:
    /// - `GOOGLE_CREDENTIALS_JSON`: service-account JSON - REQUIRED
    /// - `SLACK_BOT_TOKEN`: Slack bot token - REQUIRED
    pub fn from_env() -> Result<Self, ConfigError> {
        let google_credentials = read_secret(GOOGLE_CREDENTIALS_VAR);
        let slack_token = read_secret(SLACK_TOKEN_VAR);

        match (google_credentials, slack_token) {
            (Some(google_credentials), Some(slack_token)) => Ok(Config {
                google_credentials,
                slack_token,
                report: ReportSettings::default(),
            }),
            (google_credentials, slack_token) => {
                let mut missing = Vec::new();
                if google_credentials.is_none() {
                    missing.push(GOOGLE_CREDENTIALS_VAR);
                }
                if slack_token.is_none() {
                    missing.push(SLACK_TOKEN_VAR);
                }
                Err(ConfigError::MissingSecrets(missing))
            }
        }
    }
}

/// Read an environment variable as a secret, treating empty values as unset.
fn read_secret(name: &str) -> Option<SecretString> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(SecretString::from(value)),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variables:\n{}", .0.iter().map(|v| format!("  - {}", v)).collect::<Vec<_>>().join("\n"))]
    MissingSecrets(Vec<&'static str>),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),
}
