//! Bug-tracker models.

use serde::{Deserialize, Serialize};

/// One fetched bug-tracker row, reduced to what the report needs.
///
/// Materialized per row while counting, then discarded; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugRecord {
    /// Category (worksheet) the bug belongs to
    pub category: String,
    /// Raw date cell text, `MM/DD/YYYY`
    pub reported_on: String,
}

impl BugRecord {
    /// Create a new bug record.
    pub fn new(category: impl Into<String>, reported_on: impl Into<String>) -> Self {
        BugRecord {
            category: category.into(),
            reported_on: reported_on.into(),
        }
    }
}

/// In-window bug counts keyed by category.
///
/// Iteration order is insertion order, which the aggregator keeps equal to
/// the configured category list. Every configured category appears here even
/// when its count is 0 or its fetch failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryBugCounts {
    counts: Vec<(String, usize)>,
}

impl CategoryBugCounts {
    /// Create an empty count set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a category's count.
    pub fn push(&mut self, category: impl Into<String>, count: usize) {
        self.counts.push((category.into(), count));
    }

    /// Sum of all category counts.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    /// Categories with counts, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True when no categories have been recorded.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
