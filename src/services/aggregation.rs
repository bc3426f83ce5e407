//! Aggregation: per-category bug counting and test-run reduction.

use tracing::{info, warn};

use crate::config::ReportSettings;
use crate::models::{BugRecord, CategoryBugCounts, TestAggregate, TestRunRecord};
use crate::services::window::DateWindowFilter;
use crate::services::{RawMessage, RowSource};

/// Count in-window bugs for every configured category.
///
/// Categories are visited in configured order and every one of them ends up
/// in the result. A failed fetch contributes a count of 0 and a warning; the
/// remaining categories still report.
pub async fn collect_bug_counts(
    source: &dyn RowSource,
    filter: &DateWindowFilter,
    settings: &ReportSettings,
) -> CategoryBugCounts {
    let mut counts = CategoryBugCounts::new();

    for category in &settings.categories {
        info!("Reading '{}'...", category);

        let count = match source.fetch_rows(category).await {
            Ok(rows) => rows
                .iter()
                .filter_map(|row| row.get(&settings.date_column))
                .map(|date| BugRecord::new(category.clone(), date.clone()))
                .filter(|bug| filter.contains_date_str(&bug.reported_on))
                .count(),
            Err(e) => {
                warn!("Error reading sheet '{}': {}", category, e);
                0
            }
        };

        info!(
            "Found {} bug{}",
            count,
            if count != 1 { "s" } else { "" }
        );
        counts.push(category.clone(), count);
    }

    counts
}

/// Extract test-run records from a fetched message window.
pub fn extract_test_runs(messages: &[RawMessage]) -> Vec<TestRunRecord> {
    messages
        .iter()
        .filter_map(|message| {
            super::extraction::extract_test_run(&message.text, message.posted_at)
        })
        .collect()
}

/// Reduce extracted runs to the weekly aggregate; `None` when nothing ran.
pub fn aggregate_test_runs(runs: &[TestRunRecord]) -> Option<TestAggregate> {
    TestAggregate::from_runs(runs)
}
