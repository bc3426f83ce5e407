//! Trailing date-window membership.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Date format used by the bug-tracker date column.
const DATE_FORMAT: &str = "%m/%d/%Y";

/// Membership test for the closed interval `[now - window, now]`.
///
/// Record dates and `now` are compared as naive values with no timezone
/// normalization; the tracker and the report job are assumed to share one
/// local timezone. This matches the upstream data's behavior and is kept
/// deliberately, imprecision included.
#[derive(Debug, Clone)]
pub struct DateWindowFilter {
    now: NaiveDateTime,
    window: Duration,
}

impl DateWindowFilter {
    /// Create a filter over the `days` trailing days ending at `now`.
    pub fn last_days(now: NaiveDateTime, days: i64) -> Self {
        DateWindowFilter {
            now,
            window: Duration::days(days),
        }
    }

    /// Parse a `MM/DD/YYYY` date cell; whitespace is tolerated.
    pub fn parse_date(date_str: &str) -> Option<NaiveDateTime> {
        NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    }

    /// True when `instant` falls within the window, bounds included.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        let oldest = self.now - self.window;
        oldest <= instant && instant <= self.now
    }

    /// Window membership for a raw date cell.
    ///
    /// Unparseable text is non-membership, not an error.
    pub fn contains_date_str(&self, date_str: &str) -> bool {
        match Self::parse_date(date_str) {
            Some(instant) => self.contains(instant),
            None => false,
        }
    }
}
