//! Digest rendering.
//!
//! Pure transformation of aggregated statistics into the digest document.
//! Section ordering is constant: header, bug summary, divider, breakdown,
//! test summary (or an explicit "none" line), footer. Chat-side rendering
//! relies on that ordering, so nothing here branches on document shape.

use chrono::{DateTime, Utc};

use crate::models::{CategoryBugCounts, DigestBlock, DigestDocument, TestAggregate};

/// Digest header text.
const HEADER_TEXT: &str = "📊 Weekly QA Report";

/// Footer timestamp format; the generation instant is always UTC-labeled.
const FOOTER_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Pluralized unit noun for a bug count.
fn bug_noun(count: usize) -> &'static str {
    if count != 1 { "bugs" } else { "bug" }
}

/// Render the weekly digest.
pub fn render_digest(
    bug_counts: &CategoryBugCounts,
    aggregate: Option<&TestAggregate>,
    generated_at: DateTime<Utc>,
) -> DigestDocument {
    let mut document = DigestDocument::new();

    document.push(DigestBlock::Header {
        text: HEADER_TEXT.to_string(),
    });

    document.push(DigestBlock::Section {
        text: format!("*Total bugs found this week: {}*", bug_counts.total()),
    });

    document.push(DigestBlock::Divider);

    let mut breakdown = String::from("*Breakdown by feature:*\n");
    for (category, count) in bug_counts.iter() {
        breakdown.push_str(&format!("• {}: {} {}\n", category, count, bug_noun(count)));
    }
    document.push(DigestBlock::Section { text: breakdown });

    document.push(DigestBlock::Section {
        text: render_test_section(aggregate),
    });

    document.push(DigestBlock::Context {
        text: format!("Report generated: {}", generated_at.format(FOOTER_FORMAT)),
    });

    document
}

/// Test-summary section body. Present whether or not any runs were seen.
fn render_test_section(aggregate: Option<&TestAggregate>) -> String {
    let Some(aggregate) = aggregate else {
        return "*Test automation:*\nNo test runs found this week.".to_string();
    };

    let tier = aggregate.tier();
    format!(
        "*Test automation:*\n{} {}: {:.1}% pass rate\nRuns: {} ({} successful, {} failed)\nTests: {} total, {} passed, {} failed, {} flaky",
        tier.indicator(),
        tier.label(),
        aggregate.pass_rate,
        aggregate.total_runs,
        aggregate.successful_runs,
        aggregate.failed_runs,
        aggregate.total_tests,
        aggregate.total_passed,
        aggregate.total_failed,
        aggregate.total_flaky,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::models::TestRunRecord;

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
    }

    fn counts(pairs: &[(&str, usize)]) -> CategoryBugCounts {
        let mut counts = CategoryBugCounts::new();
        for (name, count) in pairs {
            counts.push(*name, *count);
        }
        counts
    }

    fn section_text(document: &DigestDocument, index: usize) -> String {
        match &document.blocks()[index] {
            DigestBlock::Section { text } => text.clone(),
            other => panic!("expected section at {}, got {:?}", index, other),
        }
    }

    #[test]
    fn test_section_order_is_constant() {
        let with_runs = render_digest(
            &counts(&[("Tournaments", 3)]),
            TestAggregate::from_runs(&[TestRunRecord::new(
                10,
                10,
                0,
                0,
                "5m".to_string(),
                generated_at(),
            )])
            .as_ref(),
            generated_at(),
        );
        let without_runs = render_digest(&counts(&[("Tournaments", 3)]), None, generated_at());

        for document in [&with_runs, &without_runs] {
            let blocks = document.blocks();
            assert_eq!(blocks.len(), 6);
            assert!(matches!(blocks[0], DigestBlock::Header { .. }));
            assert!(matches!(blocks[1], DigestBlock::Section { .. }));
            assert!(matches!(blocks[2], DigestBlock::Divider));
            assert!(matches!(blocks[3], DigestBlock::Section { .. }));
            assert!(matches!(blocks[4], DigestBlock::Section { .. }));
            assert!(matches!(blocks[5], DigestBlock::Context { .. }));
        }
    }

    #[test]
    fn test_breakdown_lines_and_pluralization() {
        let document = render_digest(
            &counts(&[("Tournaments", 3), ("Rakeback", 0), ("Boosters", 1)]),
            None,
            generated_at(),
        );

        let breakdown = section_text(&document, 3);
        assert!(breakdown.contains("• Tournaments: 3 bugs"));
        assert!(breakdown.contains("• Rakeback: 0 bugs"));
        assert!(breakdown.contains("• Boosters: 1 bug\n"));

        // One line per category, configured order
        let lines: Vec<&str> = breakdown.lines().skip(1).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Tournaments"));
        assert!(lines[1].contains("Rakeback"));
        assert!(lines[2].contains("Boosters"));
    }

    #[test]
    fn test_total_line_sums_categories() {
        let document = render_digest(
            &counts(&[("Tournaments", 3), ("Rakeback", 2)]),
            None,
            generated_at(),
        );
        assert_eq!(
            section_text(&document, 1),
            "*Total bugs found this week: 5*"
        );
    }

    #[test]
    fn test_missing_aggregate_renders_explicit_none_line() {
        let document = render_digest(&counts(&[("Tournaments", 0)]), None, generated_at());
        let section = section_text(&document, 4);
        assert!(section.contains("No test runs found this week."));
    }

    #[test]
    fn test_aggregate_section_shows_tier_and_totals() {
        let aggregate = TestAggregate::from_runs(&[
            TestRunRecord::new(100, 98, 2, 1, "3m45s".to_string(), generated_at()),
            TestRunRecord::new(50, 50, 0, 0, "2m".to_string(), generated_at()),
        ])
        .unwrap();

        let document = render_digest(
            &counts(&[("Tournaments", 1)]),
            Some(&aggregate),
            generated_at(),
        );
        let section = section_text(&document, 4);

        assert!(section.contains("🟢 Healthy: 98.7% pass rate"));
        assert!(section.contains("Runs: 2 (1 successful, 1 failed)"));
        assert!(section.contains("Tests: 150 total, 148 passed, 2 failed, 1 flaky"));
    }

    #[test]
    fn test_warning_and_critical_tiers_render() {
        let warning = TestAggregate::from_runs(&[TestRunRecord::new(
            100,
            90,
            10,
            0,
            "1m".to_string(),
            generated_at(),
        )])
        .unwrap();
        let critical = TestAggregate::from_runs(&[TestRunRecord::new(
            100,
            50,
            50,
            0,
            "1m".to_string(),
            generated_at(),
        )])
        .unwrap();

        let body = render_test_section(Some(&warning));
        assert!(body.contains("🟠 Warning: 90.0% pass rate"));

        let body = render_test_section(Some(&critical));
        assert!(body.contains("🔴 Critical: 50.0% pass rate"));
    }

    #[test]
    fn test_footer_is_fixed_utc_format() {
        let document = render_digest(&counts(&[]), None, generated_at());
        match document.blocks().last().unwrap() {
            DigestBlock::Context { text } => {
                assert_eq!(text, "Report generated: 2024-03-15 10:00:00 UTC");
            }
            other => panic!("expected context footer, got {:?}", other),
        }
    }
}
