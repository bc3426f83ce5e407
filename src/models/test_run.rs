//! Test-run models: per-message records and the weekly aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Runtime sentinel used when a status message carries no runtime line.
pub const UNKNOWN_RUNTIME: &str = "unknown";

/// Outcome of a single test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failure,
}

impl RunStatus {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One reported test-suite execution, parsed from a single status message.
///
/// Immutable once constructed; the derived fields are computed by
/// [`TestRunRecord::new`]. `passed + failed <= total` is expected but not
/// enforced, since flaky tests can double count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRunRecord {
    /// Total tests in the run
    pub total: u32,
    /// Tests that passed
    pub passed: u32,
    /// Tests that failed
    pub failed: u32,
    /// Tests flagged flaky
    pub flaky: u32,
    /// Opaque runtime text ("3m45s"), or [`UNKNOWN_RUNTIME`]
    pub runtime: String,
    /// Passed/total as a percentage; 0 when the run had no tests
    pub pass_rate: f64,
    /// Success iff no test failed
    pub status: RunStatus,
    /// When the status message was sent
    pub posted_at: DateTime<Utc>,
}

impl TestRunRecord {
    /// Create a record, deriving pass rate and status.
    pub fn new(
        total: u32,
        passed: u32,
        failed: u32,
        flaky: u32,
        runtime: String,
        posted_at: DateTime<Utc>,
    ) -> Self {
        let pass_rate = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64 * 100.0
        };
        let status = if failed == 0 {
            RunStatus::Success
        } else {
            RunStatus::Failure
        };

        TestRunRecord {
            total,
            passed,
            failed,
            flaky,
            runtime,
            pass_rate,
            status,
            posted_at,
        }
    }
}

/// Pass-rate health classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthTier {
    Healthy,
    Warning,
    Critical,
}

impl HealthTier {
    /// Classify a pass-rate percentage.
    pub fn from_pass_rate(pass_rate: f64) -> Self {
        if pass_rate >= 95.0 {
            Self::Healthy
        } else if pass_rate >= 80.0 {
            Self::Warning
        } else {
            Self::Critical
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }

    /// Status indicator shown next to the label.
    pub fn indicator(&self) -> &'static str {
        match self {
            Self::Healthy => "🟢",
            Self::Warning => "🟠",
            Self::Critical => "🔴",
        }
    }
}

/// Summary statistics over a week of test runs.
///
/// Only built via [`TestAggregate::from_runs`]; an empty run sequence yields
/// no aggregate at all, which downstream rendering treats as "no test runs
/// this week" rather than a zero-filled table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestAggregate {
    /// Number of runs seen in the window
    pub total_runs: usize,
    /// Runs with zero failures
    pub successful_runs: usize,
    /// Runs with at least one failure
    pub failed_runs: usize,
    /// Summed test counts across runs
    pub total_tests: u64,
    /// Summed passed counts
    pub total_passed: u64,
    /// Summed failed counts
    pub total_failed: u64,
    /// Summed flaky counts
    pub total_flaky: u64,
    /// Summed passed / summed total as a percentage; 0 when no tests ran
    pub pass_rate: f64,
}

impl TestAggregate {
    /// Reduce a sequence of run records. Returns `None` for empty input.
    pub fn from_runs(runs: &[TestRunRecord]) -> Option<Self> {
        if runs.is_empty() {
            return None;
        }

        let successful_runs = runs
            .iter()
            .filter(|run| run.status == RunStatus::Success)
            .count();
        let total_tests: u64 = runs.iter().map(|run| run.total as u64).sum();
        let total_passed: u64 = runs.iter().map(|run| run.passed as u64).sum();
        let pass_rate = if total_tests == 0 {
            0.0
        } else {
            total_passed as f64 / total_tests as f64 * 100.0
        };

        Some(TestAggregate {
            total_runs: runs.len(),
            successful_runs,
            failed_runs: runs.len() - successful_runs,
            total_tests,
            total_passed,
            total_failed: runs.iter().map(|run| run.failed as u64).sum(),
            total_flaky: runs.iter().map(|run| run.flaky as u64).sum(),
            pass_rate,
        })
    }

    /// Health tier for the overall pass rate.
    pub fn tier(&self) -> HealthTier {
        HealthTier::from_pass_rate(self.pass_rate)
    }
}
