//! Post-run processing utilities.
//!
//! Handles the re-shuffle after a stop, recovery after a lost worker, and the
//! status messages shown once a run has wound down.

use crate::bars::Bars;
use crate::engine::RunOutput;
use crate::model::{Algorithm, RunOutcome, RunReport};
use rand::rngs::StdRng;

/// Result of post-run processing, ready for presentation layers.
pub(crate) struct ProcessedRun {
    pub bars: Bars,
    pub report: RunReport,
    pub messages: Vec<String>,
    /// The sequence was replaced and needs a fresh idle frame.
    pub reshuffled: bool,
}

/// Process a finished run: a stopped run leaves a half-sorted sequence behind, so it is
/// replaced with a fresh shuffle. Completed and faulted runs keep the sequence as-is.
pub(crate) fn process_run_completion(output: RunOutput, rng: &mut StdRng) -> ProcessedRun {
    let RunOutput { mut bars, report } = output;
    let mut messages = Vec::new();
    let mut reshuffled = false;

    match report.outcome {
        RunOutcome::Completed => match report.search {
            Some(search) => messages.push(search.to_message()),
            None => messages.push(format!(
                "{} done: {} comparisons, {} swaps",
                report.algorithm, report.comparisons, report.swaps
            )),
        },
        RunOutcome::Stopped => {
            bars.randomize(rng);
            reshuffled = true;
            messages.push(format!("{} stopped; shuffled", report.algorithm));
        }
        RunOutcome::Faulted => {
            let reason = report.fault.as_deref().unwrap_or("unknown fault");
            messages.push(format!("Run failed: {reason}"));
        }
    }

    ProcessedRun {
        bars,
        report,
        messages,
        reshuffled,
    }
}

/// Build a faulted output when the run task itself was lost, restoring the pre-run sequence.
pub(crate) fn recover_output(algorithm: Algorithm, fallback: Vec<u32>, err: String) -> RunOutput {
    let bars = Bars::from_values(fallback);
    let report = RunReport {
        timestamp_utc: String::new(),
        algorithm,
        outcome: RunOutcome::Faulted,
        comparisons: 0,
        swaps: 0,
        steps: 0,
        elapsed_ms: 0,
        search: None,
        fault: Some(err),
        final_values: bars.snapshot(),
    };
    RunOutput { bars, report }
}
