//! Text summary builder for CLI output.
//!
//! This module formats human-readable lines for text mode from a finished run.

use crate::model::{RunOutcome, RunReport};
use anyhow::{Context, Result};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Values printed per line when echoing the final sequence.
const VALUES_PER_LINE: usize = 15;

/// Build a text summary from a run report.
pub(crate) fn build_text_summary(report: &RunReport) -> Result<TextSummary> {
    let mut lines = Vec::new();

    lines.push(format!("Algorithm: {}", report.algorithm));
    lines.push(format!("Outcome: {}", report.outcome.label()));
    if report.outcome == RunOutcome::Faulted {
        let reason = report
            .fault
            .as_deref()
            .context("faulted run carries no reason")?;
        lines.push(format!("Fault: {reason}"));
    }
    if let Some(search) = report.search {
        lines.push(format!("Target: {}", search.target));
        if search.presorted {
            lines.push("Sequence sorted before searching".to_string());
        }
        lines.push(search.to_message());
    }
    lines.push(format!(
        "Comparisons: {} | Swaps: {} | Steps: {}",
        report.comparisons, report.swaps, report.steps
    ));
    lines.push(format!("Elapsed: {} ms", report.elapsed_ms));

    if !report.final_values.is_empty() {
        lines.push("Final sequence:".to_string());
        for chunk in report.final_values.chunks(VALUES_PER_LINE) {
            let row: Vec<String> = chunk.iter().map(|v| format!("{v:>3}")).collect();
            lines.push(format!("  {}", row.join(" ")));
        }
    }

    Ok(TextSummary { lines })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Algorithm, SearchResult};

    fn report() -> RunReport {
        RunReport {
            timestamp_utc: "2024-01-01T00:00:00Z".into(),
            algorithm: Algorithm::BubbleSort,
            outcome: RunOutcome::Completed,
            comparisons: 10,
            swaps: 7,
            steps: 17,
            elapsed_ms: 3,
            search: None,
            fault: None,
            final_values: vec![1, 2, 3, 4, 5],
        }
    }

    #[test]
    fn sort_summary_lists_counters_and_values() {
        let summary = build_text_summary(&report()).unwrap();
        assert_eq!(summary.lines[0], "Algorithm: Bubble Sort");
        assert_eq!(summary.lines[1], "Outcome: completed");
        assert!(summary
            .lines
            .contains(&"Comparisons: 10 | Swaps: 7 | Steps: 17".to_string()));
        assert_eq!(summary.lines.last().unwrap(), "    1   2   3   4   5");
    }

    #[test]
    fn search_summary_includes_result() {
        let mut r = report();
        r.algorithm = Algorithm::BinarySearch;
        r.search = Some(SearchResult {
            target: 4,
            index: Some(3),
            presorted: true,
        });
        let summary = build_text_summary(&r).unwrap();
        assert!(summary.lines.contains(&"Target: 4".to_string()));
        assert!(summary
            .lines
            .contains(&"Sequence sorted before searching".to_string()));
        assert!(summary.lines.contains(&"Found 4 at index 3".to_string()));
    }

    #[test]
    fn faulted_summary_requires_reason() {
        let mut r = report();
        r.outcome = RunOutcome::Faulted;
        assert!(build_text_summary(&r).is_err());
        r.fault = Some("worker panicked".into());
        let summary = build_text_summary(&r).unwrap();
        assert!(summary.lines.contains(&"Fault: worker panicked".to_string()));
    }
}
