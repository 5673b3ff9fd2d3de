mod search;
mod sorts;
mod stepper;

pub use stepper::{FrameTx, Pacer};

use stepper::{ExecFlags, Halt, StepResult, Stepper, Tally};

use crate::bars::Bars;
use crate::model::{Algorithm, Frame, RunOutcome, RunReport, SearchResult, SortEvent};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};

#[derive(Debug, Clone)]
pub enum EngineControl {
    /// Pause (true) or resume (false) the running algorithm
    Pause(bool),
    /// Advance exactly one checkpoint while paused
    Step,
    /// Abandon the run at the next checkpoint
    Stop,
}

/// What a finished run hands back: the sequence (ownership returns to the caller) and the report.
pub struct RunOutput {
    pub bars: Bars,
    pub report: RunReport,
}

pub struct SortEngine {
    algorithm: Algorithm,
    pacer: Pacer,
    rng: StdRng,
}

impl SortEngine {
    pub fn new(algorithm: Algorithm, pacer: Pacer, rng: StdRng) -> Self {
        Self {
            algorithm,
            pacer,
            rng,
        }
    }

    pub async fn run(
        self,
        bars: Bars,
        frame_tx: FrameTx,
        event_tx: mpsc::UnboundedSender<SortEvent>,
        mut control_rx: mpsc::UnboundedReceiver<EngineControl>,
    ) -> RunOutput {
        let Self {
            algorithm,
            pacer,
            mut rng,
        } = self;
        let flags = Arc::new(ExecFlags::new());
        let started = Instant::now();
        let timestamp_utc = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into());
        let fallback = bars.snapshot();

        // Controls queued before the start apply before the first step.
        while let Ok(msg) = control_rx.try_recv() {
            apply_control(&flags, msg);
        }

        // Control listener.
        let flags2 = flags.clone();
        let control_handle = tokio::spawn(async move {
            while let Some(msg) = control_rx.recv().await {
                let stop = matches!(msg, EngineControl::Stop);
                apply_control(&flags2, msg);
                if stop {
                    break;
                }
            }
        });

        log::info!("starting {} on {} bars", algorithm, bars.len());
        let _ = event_tx.send(SortEvent::RunStarted { algorithm });

        let worker_flags = flags.clone();
        let worker_frames = frame_tx.clone();
        let worker_events = event_tx.clone();
        let worker = tokio::task::spawn_blocking(move || {
            let mut bars = bars;
            let (res, tally) = execute(
                algorithm,
                &mut bars,
                &worker_flags,
                &pacer,
                &worker_frames,
                &worker_events,
                &mut rng,
            );
            (bars, res, tally)
        });

        let (bars, res, tally) = match worker.await {
            Ok(out) => out,
            Err(e) => {
                // The worker's copy of the sequence died with it.
                let bars = Bars::from_values(fallback);
                frame_tx.send_replace(Frame::idle(bars.snapshot(), 0));
                (
                    bars,
                    Err(Halt::Fault(anyhow::anyhow!("worker panicked: {e}"))),
                    Tally::default(),
                )
            }
        };

        // Dropping a JoinHandle does not cancel the task; abort the listener explicitly.
        control_handle.abort();
        flags.reset();

        if res.is_ok() && !algorithm.is_search() && !bars.is_sorted() {
            log::warn!("{} finished but the sequence is out of order", algorithm);
        }
        let (outcome, search, fault) = match res {
            Ok(search) => (RunOutcome::Completed, search, None),
            Err(Halt::Stopped) => (RunOutcome::Stopped, None, None),
            Err(Halt::Fault(e)) => {
                log::error!("{} faulted: {e:#}", algorithm);
                (RunOutcome::Faulted, None, Some(format!("{e:#}")))
            }
        };
        log::info!(
            "{} {} after {} steps ({} comparisons, {} swaps)",
            algorithm,
            outcome.label(),
            tally.steps,
            tally.counters.comparisons,
            tally.counters.swaps
        );

        let report = RunReport {
            timestamp_utc,
            algorithm,
            outcome,
            comparisons: tally.counters.comparisons,
            swaps: tally.counters.swaps,
            steps: tally.steps,
            elapsed_ms: started.elapsed().as_millis() as u64,
            search,
            fault,
            final_values: bars.snapshot(),
        };
        RunOutput { bars, report }
    }
}

fn apply_control(flags: &ExecFlags, msg: EngineControl) {
    match msg {
        EngineControl::Pause(p) => flags.set_paused(p),
        EngineControl::Step => flags.request_step(),
        EngineControl::Stop => flags.request_stop(),
    }
}

/// Drive one algorithm on the worker thread and close out the stepper.
fn execute(
    algorithm: Algorithm,
    bars: &mut Bars,
    flags: &ExecFlags,
    pacer: &Pacer,
    frames: &watch::Sender<Frame>,
    events: &mpsc::UnboundedSender<SortEvent>,
    rng: &mut StdRng,
) -> (StepResult<Option<SearchResult>>, Tally) {
    let mut st = Stepper::new(bars, flags, pacer, frames);
    let res = dispatch(algorithm, &mut st, events, rng);
    let tally = st.finish();
    (res, tally)
}

fn dispatch(
    algorithm: Algorithm,
    st: &mut Stepper<'_>,
    events: &mpsc::UnboundedSender<SortEvent>,
    rng: &mut StdRng,
) -> StepResult<Option<SearchResult>> {
    match algorithm {
        Algorithm::BubbleSort => sorts::bubble_sort(st)?,
        Algorithm::SelectionSort => sorts::selection_sort(st)?,
        Algorithm::InsertionSort => sorts::insertion_sort(st)?,
        Algorithm::QuickSort => sorts::quick_sort(st)?,
        Algorithm::MergeSort => sorts::merge_sort(st)?,
        Algorithm::HeapSort => sorts::heap_sort(st)?,
        Algorithm::LinearSearch | Algorithm::BinarySearch => {
            return run_search(algorithm == Algorithm::BinarySearch, st, events, rng).map(Some);
        }
    }
    Ok(None)
}

/// Pick a target from a random slot, then probe for it.
///
/// Binary search captures the target first and sorts the sequence instantly
/// before probing; linear search works on the sequence as it is.
fn run_search(
    binary: bool,
    st: &mut Stepper<'_>,
    events: &mpsc::UnboundedSender<SortEvent>,
    rng: &mut StdRng,
) -> StepResult<SearchResult> {
    if st.is_empty() {
        return Err(Halt::Fault(anyhow::anyhow!(
            "cannot search an empty sequence"
        )));
    }
    let target = st.value(rng.gen_range(0..st.len()));
    if binary {
        st.sort_instantly();
    }
    let _ = events.send(SortEvent::SearchStarted {
        target,
        presorted: binary,
    });

    let index = if binary {
        search::binary_search(st, target)?
    } else {
        search::linear_search(st, target)?
    };
    let result = SearchResult {
        target,
        index,
        presorted: binary,
    };
    let _ = events.send(SortEvent::SearchFinished { result });
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SpeedRange;
    use rand::SeedableRng;
    use std::time::Duration;

    struct Wiring {
        frame_tx: FrameTx,
        frame_rx: watch::Receiver<Frame>,
        event_tx: mpsc::UnboundedSender<SortEvent>,
        event_rx: mpsc::UnboundedReceiver<SortEvent>,
        ctrl_tx: mpsc::UnboundedSender<EngineControl>,
        ctrl_rx: mpsc::UnboundedReceiver<EngineControl>,
    }

    fn wiring() -> Wiring {
        let (frame_tx, frame_rx) = watch::channel(Frame::default());
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();
        Wiring {
            frame_tx: Arc::new(frame_tx),
            frame_rx,
            event_tx,
            event_rx,
            ctrl_tx,
            ctrl_rx,
        }
    }

    fn engine(algorithm: Algorithm, seed: u64) -> SortEngine {
        SortEngine::new(
            algorithm,
            Pacer::unpaced(SpeedRange::default(), 30),
            StdRng::seed_from_u64(seed),
        )
    }

    async fn wait_for_step(rx: &watch::Receiver<Frame>, step: u64) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while rx.borrow().step < step {
            assert!(Instant::now() < deadline, "timed out waiting for step {step}");
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    #[tokio::test]
    async fn every_algorithm_completes_on_random_bars() {
        let mut rng = StdRng::seed_from_u64(11);
        for algorithm in Algorithm::ALL {
            let w = wiring();
            let bars = Bars::random(&mut rng);
            let mut expected = bars.snapshot();
            expected.sort_unstable();
            let before = bars.snapshot();

            let out = engine(algorithm, 5)
                .run(bars, w.frame_tx.clone(), w.event_tx.clone(), w.ctrl_rx)
                .await;
            assert_eq!(out.report.outcome, RunOutcome::Completed, "{algorithm}");

            if let Some(search) = out.report.search {
                assert!(algorithm.is_search());
                let idx = search.index.expect("target comes from the sequence");
                assert_eq!(out.bars.get(idx), search.target);
                if algorithm == Algorithm::LinearSearch {
                    assert_eq!(out.bars.snapshot(), before, "linear search reordered");
                } else {
                    assert!(out.bars.is_sorted());
                }
            } else {
                assert!(!algorithm.is_search());
                assert_eq!(out.bars.snapshot(), expected, "{algorithm}");
            }

            let last = w.frame_rx.borrow().clone();
            assert_eq!(last.highlight1, None);
            assert_eq!(last.highlight2, None);
            assert_eq!(last.values, out.report.final_values);
        }
    }

    #[tokio::test]
    async fn run_emits_lifecycle_events() {
        let mut w = wiring();
        let bars = Bars::from_values(vec![7, 2, 9, 4]);
        let out = engine(Algorithm::LinearSearch, 1)
            .run(bars, w.frame_tx.clone(), w.event_tx.clone(), w.ctrl_rx)
            .await;
        drop(w.event_tx);

        let mut events = Vec::new();
        while let Some(ev) = w.event_rx.recv().await {
            events.push(ev);
        }
        assert!(matches!(
            events.first(),
            Some(SortEvent::RunStarted {
                algorithm: Algorithm::LinearSearch
            })
        ));
        assert!(events
            .iter()
            .any(|e| matches!(e, SortEvent::SearchStarted { presorted: false, .. })));
        let finished = events.iter().find_map(|e| match e {
            SortEvent::SearchFinished { result } => Some(*result),
            _ => None,
        });
        assert_eq!(finished, out.report.search);
    }

    #[tokio::test]
    async fn binary_search_sorts_before_probing() {
        let w = wiring();
        let bars = Bars::from_values(vec![9, 4, 7, 1, 2]);
        let out = engine(Algorithm::BinarySearch, 3)
            .run(bars, w.frame_tx.clone(), w.event_tx.clone(), w.ctrl_rx)
            .await;
        assert_eq!(out.bars.snapshot(), vec![1, 2, 4, 7, 9]);
        let search = out.report.search.expect("search result");
        assert!(search.presorted);
        assert!(search.index.is_some());
        // the instant sort does not count
        assert_eq!(out.report.swaps, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pause_and_step_advance_one_checkpoint_at_a_time() {
        let w = wiring();
        w.ctrl_tx.send(EngineControl::Pause(true)).unwrap();
        let bars = Bars::from_values(vec![5, 3, 1, 4, 2]);
        let frame_tx = w.frame_tx.clone();
        let event_tx = w.event_tx.clone();
        let handle = tokio::spawn(engine(Algorithm::BubbleSort, 0).run(
            bars,
            frame_tx,
            event_tx,
            w.ctrl_rx,
        ));

        wait_for_step(&w.frame_rx, 1).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        let frame = w.frame_rx.borrow().clone();
        assert_eq!(frame.step, 1);
        assert_eq!(frame.comparisons, 1);
        assert_eq!(frame.values, vec![5, 3, 1, 4, 2]);

        w.ctrl_tx.send(EngineControl::Step).unwrap();
        wait_for_step(&w.frame_rx, 2).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        let frame = w.frame_rx.borrow().clone();
        assert_eq!(frame.step, 2);
        assert_eq!(frame.swaps, 1);
        assert_eq!(frame.values, vec![3, 5, 1, 4, 2]);

        w.ctrl_tx.send(EngineControl::Pause(false)).unwrap();
        let out = handle.await.unwrap();
        assert_eq!(out.report.outcome, RunOutcome::Completed);
        assert_eq!(out.bars.snapshot(), vec![1, 2, 3, 4, 5]);
        assert_eq!(out.report.comparisons, 10);
        assert_eq!(out.report.swaps, 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_while_paused_ends_run() {
        let w = wiring();
        w.ctrl_tx.send(EngineControl::Pause(true)).unwrap();
        let bars = Bars::from_values(vec![4, 3, 2, 1]);
        let frame_tx = w.frame_tx.clone();
        let event_tx = w.event_tx.clone();
        let handle = tokio::spawn(engine(Algorithm::QuickSort, 0).run(
            bars,
            frame_tx,
            event_tx,
            w.ctrl_rx,
        ));

        wait_for_step(&w.frame_rx, 1).await;
        w.ctrl_tx.send(EngineControl::Stop).unwrap();
        let out = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("stop was not observed")
            .unwrap();
        assert_eq!(out.report.outcome, RunOutcome::Stopped);
        assert_eq!(out.report.steps, 1);
        assert_eq!(out.bars.len(), 4);
    }

    #[tokio::test]
    async fn detached_presentation_faults_the_run() {
        let w = wiring();
        drop(w.frame_rx);
        let bars = Bars::from_values(vec![3, 2, 1]);
        let out = engine(Algorithm::SelectionSort, 0)
            .run(bars, w.frame_tx.clone(), w.event_tx.clone(), w.ctrl_rx)
            .await;
        assert_eq!(out.report.outcome, RunOutcome::Faulted);
        assert!(out.report.fault.is_some());
        // the sequence is left as-is
        assert_eq!(out.bars.snapshot(), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn counters_reset_between_runs() {
        let mut rng = StdRng::seed_from_u64(99);
        let bars = Bars::random(&mut rng);

        let w = wiring();
        let first = engine(Algorithm::InsertionSort, 0)
            .run(bars, w.frame_tx.clone(), w.event_tx.clone(), w.ctrl_rx)
            .await;
        assert!(first.report.swaps > 0);

        // Second pass over the now sorted bars starts from zero again.
        let w = wiring();
        let n = first.bars.len() as u64;
        let second = engine(Algorithm::InsertionSort, 0)
            .run(first.bars, w.frame_tx.clone(), w.event_tx.clone(), w.ctrl_rx)
            .await;
        assert_eq!(second.report.comparisons, n - 1);
        assert_eq!(second.report.swaps, 0);
        assert_eq!(w.frame_rx.borrow().comparisons, n - 1);
    }
}
