//! Slack Web API adapter: channel history source and digest sink.
//!
//! History is fetched through the legacy private-group endpoint first and
//! falls back to the conversations API when the workspace no longer serves
//! the legacy method. The reporting core only ever sees the
//! [`MessageHistory`]/[`MessageSink`] traits, never which endpoint answered.

use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::DigestDocument;
use crate::services::{MessageHistory, MessageSink, RawMessage};

/// Web API base URL.
const SLACK_API_BASE: &str = "https://slack.com/api";

/// Legacy private-group history method, tried first.
const LEGACY_HISTORY_METHOD: &str = "groups.history";

/// Generic conversation history method, the fallback.
const HISTORY_METHOD: &str = "conversations.history";

/// API error codes meaning "this method is not served here".
const UNSUPPORTED_METHOD_ERRORS: &[&str] =
    &["unknown_method", "method_deprecated", "deprecated_endpoint"];

/// HTTP connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP total timeout per request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// History response envelope.
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<SlackMessage>,
}

/// One wire message.
#[derive(Debug, Deserialize)]
struct SlackMessage {
    #[serde(default)]
    text: String,
    #[serde(default)]
    ts: String,
}

/// Post response envelope.
#[derive(Debug, Deserialize)]
struct PostResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack Web API client.
pub struct SlackClient {
    token: SecretString,
    api_base: String,
    http: reqwest::Client,
}

impl SlackClient {
    /// Build a client from a bot token.
    pub fn new(token: SecretString) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(SlackClient {
            token,
            api_base: SLACK_API_BASE.to_string(),
            http,
        })
    }

    /// Fetch history through one named API method.
    ///
    /// An `ok:false` envelope surfaces as [`AppError::Slack`] carrying the
    /// API's error code.
    async fn history_via(
        &self,
        method: &str,
        channel: &str,
        oldest: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<RawMessage>> {
        let url = format!("{}/{}", self.api_base, method);
        let oldest_ts = format!("{}.000000", oldest.timestamp());
        let limit_value = limit.to_string();
        // The legacy method predates the "limit" parameter name.
        let limit_param = if method == LEGACY_HISTORY_METHOD {
            "count"
        } else {
            "limit"
        };

        debug!(method = %method, channel = %channel, "fetching channel history");
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.token.expose_secret())
            .query(&[
                ("channel", channel),
                ("oldest", oldest_ts.as_str()),
                (limit_param, limit_value.as_str()),
            ])
            .send()
            .await?;

        let body: HistoryResponse = response.json().await?;
        if !body.ok {
            return Err(AppError::Slack(
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(body.messages.iter().filter_map(to_raw_message).collect())
    }
}

/// True when the error is the API's unsupported-method class.
fn is_unsupported_method(error: &AppError) -> bool {
    match error {
        AppError::Slack(code) => UNSUPPORTED_METHOD_ERRORS.contains(&code.as_str()),
        _ => false,
    }
}

/// Convert a wire message, dropping ones without a readable timestamp.
fn to_raw_message(message: &SlackMessage) -> Option<RawMessage> {
    let posted_at = parse_slack_ts(&message.ts)?;
    Some(RawMessage {
        text: message.text.clone(),
        posted_at,
    })
}

/// Parse Slack's `"1710499200.000100"` epoch-with-fraction timestamps.
fn parse_slack_ts(ts: &str) -> Option<DateTime<Utc>> {
    let epoch: f64 = ts.parse().ok()?;
    let secs = epoch.trunc() as i64;
    let nanos = (epoch.fract() * 1e9).round() as u32;
    DateTime::from_timestamp(secs, nanos)
}

#[async_trait::async_trait]
impl MessageHistory for SlackClient {
    async fn fetch_history(
        &self,
        channel: &str,
        oldest: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<RawMessage>> {
        match self
            .history_via(LEGACY_HISTORY_METHOD, channel, oldest, limit)
            .await
        {
            Ok(messages) => Ok(messages),
            Err(e) if is_unsupported_method(&e) => {
                debug!(
                    "{} not served for '{}', falling back to {}",
                    LEGACY_HISTORY_METHOD, channel, HISTORY_METHOD
                );
                match self
                    .history_via(HISTORY_METHOD, channel, oldest, limit)
                    .await
                {
                    Ok(messages) => Ok(messages),
                    Err(e) => {
                        warn!(
                            "History fetch for '{}' failed on fallback endpoint: {}",
                            channel, e
                        );
                        Ok(Vec::new())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
impl MessageSink for SlackClient {
    async fn post_message(&self, channel: &str, document: &DigestDocument) -> AppResult<()> {
        let payload = json!({
            "channel": channel,
            "text": document.to_plain_text(),
            "blocks": document.to_blocks_json(),
        });

        let response = self
            .http
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(self.token.expose_secret())
            .json(&payload)
            .send()
            .await?;

        let body: PostResponse = response.json().await?;
        if !body.ok {
            return Err(AppError::Slack(
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        info!("Message sent successfully to {}", channel);
        Ok(())
    }
}
