//! Weekly report run.
//!
//! Wires the collaborators through the reporting core: fetch and count
//! tracker rows, fetch and parse the test-run channel, render, post. One
//! sequential pass; the only tolerated failures are the per-category and
//! per-message ones handled further down the stack, plus the final post,
//! which degrades to a logged failure instead of aborting the process.

use chrono::{Duration, Local, Utc};
use tracing::{error, info};

use crate::config::ReportSettings;
use crate::error::AppResult;
use crate::services::aggregation::{aggregate_test_runs, collect_bug_counts, extract_test_runs};
use crate::services::render::render_digest;
use crate::services::window::DateWindowFilter;
use crate::services::{MessageHistory, MessageSink, RowSource};

/// One weekly digest run over the configured collaborators.
pub struct WeeklyReport<'a> {
    settings: &'a ReportSettings,
    rows: &'a dyn RowSource,
    history: &'a dyn MessageHistory,
    sink: &'a dyn MessageSink,
}

impl<'a> WeeklyReport<'a> {
    /// Assemble a run from settings and collaborators.
    pub fn new(
        settings: &'a ReportSettings,
        rows: &'a dyn RowSource,
        history: &'a dyn MessageHistory,
        sink: &'a dyn MessageSink,
    ) -> Self {
        WeeklyReport {
            settings,
            rows,
            history,
            sink,
        }
    }

    /// Run end-to-end. Returns whether the digest was posted.
    ///
    /// Bug dates compare against naive local time, the tracker's own clock
    /// convention; the channel window is epoch-based. Both cover the same
    /// trailing number of days.
    pub async fn run(&self) -> AppResult<bool> {
        let filter = DateWindowFilter::last_days(
            Local::now().naive_local(),
            self.settings.window_days,
        );
        let bug_counts = collect_bug_counts(self.rows, &filter, self.settings).await;
        info!(
            "Collected {} bugs across {} categories",
            bug_counts.total(),
            bug_counts.len()
        );

        let oldest = Utc::now() - Duration::days(self.settings.window_days);
        let messages = self
            .history
            .fetch_history(
                &self.settings.results_channel,
                oldest,
                self.settings.history_limit,
            )
            .await?;
        let runs = extract_test_runs(&messages);
        info!(
            "Extracted {} test runs from {} channel messages",
            runs.len(),
            messages.len()
        );
        let aggregate = aggregate_test_runs(&runs);

        let document = render_digest(&bug_counts, aggregate.as_ref(), Utc::now());

        match self
            .sink
            .post_message(&self.settings.digest_channel, &document)
            .await
        {
            Ok(()) => Ok(true),
            Err(e) => {
                error!(
                    "Error sending message to {}: {}",
                    self.settings.digest_channel, e
                );
                Ok(false)
            }
        }
    }
}
