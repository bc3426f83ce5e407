//! Reporting services and collaborator interfaces.
//!
//! The collaborator traits keep the reporting core free of any Google or
//! Slack specifics; the concrete adapters live in [`sheets`] and [`slack`],
//! and tests substitute in-memory fakes.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::DigestDocument;

pub mod aggregation;
pub mod extraction;
pub mod render;
pub mod report;
pub mod sheets;
pub mod slack;
pub mod window;

pub use report::WeeklyReport;
pub use sheets::SheetsClient;
pub use slack::SlackClient;
pub use window::DateWindowFilter;

/// One raw channel message.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Message body
    pub text: String,
    /// When the message was sent
    pub posted_at: DateTime<Utc>,
}

/// Source of tabular bug-tracker rows.
///
/// Rows come back keyed by header-row field name; the resource (spreadsheet)
/// id is construction-time configuration of the adapter.
#[async_trait]
pub trait RowSource {
    /// Fetch all records of one named sheet.
    async fn fetch_rows(&self, sheet_name: &str) -> AppResult<Vec<HashMap<String, String>>>;
}

/// Source of channel message history.
#[async_trait]
pub trait MessageHistory {
    /// Fetch up to `limit` messages sent to `channel` since `oldest`.
    async fn fetch_history(
        &self,
        channel: &str,
        oldest: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<RawMessage>>;
}

/// Sink for the rendered digest.
#[async_trait]
pub trait MessageSink {
    /// Post the digest to `channel`.
    async fn post_message(&self, channel: &str, document: &DigestDocument) -> AppResult<()>;
}
