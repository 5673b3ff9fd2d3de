//! Per-run executor context and the checkpoint protocol.
//!
//! Every algorithm receives a `Stepper` and calls back into it after each
//! comparison and each mutation. The stepper publishes a frame, sleeps for the
//! current delay, and parks while paused. A stop request surfaces as
//! `Err(Halt::Stopped)` so algorithms unwind with `?`.

use crate::bars::Bars;
use crate::model::{Counters, Frame, SpeedRange};
use std::cmp::Ordering as CmpOrdering;
use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::watch;

/// Poll interval while paused.
const PAUSE_POLL: Duration = Duration::from_millis(10);

/// Coalescing frame channel shared by the engine and the controller.
pub type FrameTx = Arc<watch::Sender<Frame>>;

/// Why an algorithm stopped before finishing.
#[derive(Debug)]
pub enum Halt {
    Stopped,
    Fault(anyhow::Error),
}

pub type StepResult<T = ()> = Result<T, Halt>;

/// Cooperative flags shared between the control listener and the worker.
#[derive(Debug, Default)]
pub struct ExecFlags {
    stop: AtomicBool,
    paused: AtomicBool,
    step_requested: AtomicBool,
}

impl ExecFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
        // Unpark a paused worker so it can observe the stop.
        self.paused.store(false, Ordering::Release);
        self.step_requested.store(false, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
        if !paused {
            self.step_requested.store(false, Ordering::Release);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn request_step(&self) {
        self.step_requested.store(true, Ordering::Release);
    }

    fn take_step(&self) -> bool {
        self.step_requested.swap(false, Ordering::AcqRel)
    }

    /// Back to the neutral state used before and after every run.
    pub fn reset(&self) {
        self.stop.store(false, Ordering::Release);
        self.paused.store(false, Ordering::Release);
        self.step_requested.store(false, Ordering::Release);
    }
}

/// Maps the shared speed slider to a per-step delay.
#[derive(Debug, Clone)]
pub struct Pacer {
    range: SpeedRange,
    speed: Arc<AtomicU32>,
    paced: bool,
}

impl Pacer {
    pub fn new(range: SpeedRange, speed: u32) -> Self {
        Self {
            range,
            speed: Arc::new(AtomicU32::new(range.clamp(speed))),
            paced: true,
        }
    }

    /// A pacer that never sleeps; used for headless runs and tests.
    pub fn unpaced(range: SpeedRange, speed: u32) -> Self {
        Self {
            paced: false,
            ..Self::new(range, speed)
        }
    }

    pub fn speed(&self) -> u32 {
        self.speed.load(Ordering::Relaxed)
    }

    /// Store a new slider value (clamped to the range) and return what was stored.
    pub fn set_speed(&self, speed: u32) -> u32 {
        let speed = self.range.clamp(speed);
        self.speed.store(speed, Ordering::Relaxed);
        speed
    }

    pub fn delay_ms(&self) -> u64 {
        if self.paced {
            self.range.delay_ms(self.speed())
        } else {
            0
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms())
    }
}

/// Final tallies handed back when a stepper is finished.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tally {
    pub counters: Counters,
    pub steps: u64,
}

pub struct Stepper<'a> {
    bars: &'a mut Bars,
    counters: Counters,
    highlight1: Option<usize>,
    highlight2: Option<usize>,
    steps: u64,
    flags: &'a ExecFlags,
    pacer: &'a Pacer,
    frames: &'a watch::Sender<Frame>,
}

impl<'a> Stepper<'a> {
    pub fn new(
        bars: &'a mut Bars,
        flags: &'a ExecFlags,
        pacer: &'a Pacer,
        frames: &'a watch::Sender<Frame>,
    ) -> Self {
        Self {
            bars,
            counters: Counters::default(),
            highlight1: None,
            highlight2: None,
            steps: 0,
            flags,
            pacer,
            frames,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn value(&self, i: usize) -> u32 {
        self.bars.get(i)
    }

    pub fn values(&self) -> &[u32] {
        self.bars.values()
    }

    pub fn highlight(&mut self, first: Option<usize>, second: Option<usize>) {
        self.highlight1 = first;
        self.highlight2 = second;
    }

    /// Fail fast when a stop has been requested, without taking a step.
    pub fn ensure_running(&self) -> StepResult {
        if self.flags.stop_requested() {
            Err(Halt::Stopped)
        } else {
            Ok(())
        }
    }

    /// Record one comparison between the highlighted slots and take a step.
    pub fn note_comparison(&mut self, first: Option<usize>, second: Option<usize>) -> StepResult {
        self.highlight(first, second);
        self.counters.comparisons += 1;
        self.checkpoint()
    }

    /// Compare `values[i]` with `values[j]` as one visual step.
    pub fn compare(&mut self, i: usize, j: usize) -> StepResult<CmpOrdering> {
        self.note_comparison(Some(i), Some(j))?;
        Ok(self.bars.get(i).cmp(&self.bars.get(j)))
    }

    /// Compare `values[i]` with a value held outside the sequence (key, pivot, target).
    pub fn compare_value(
        &mut self,
        i: usize,
        value: u32,
        emphasis: Option<usize>,
    ) -> StepResult<CmpOrdering> {
        self.note_comparison(Some(i), emphasis)?;
        Ok(self.bars.get(i).cmp(&value))
    }

    /// Exchange two slots as one visual step. Exchanging a slot with itself is a no-op.
    pub fn exchange(&mut self, i: usize, j: usize) -> StepResult {
        if i == j {
            return Ok(());
        }
        self.bars.swap(i, j);
        self.counters.swaps += 1;
        self.highlight(Some(i), Some(j));
        self.checkpoint()
    }

    /// Overwrite a slot with a relocated value as one visual step.
    pub fn place(&mut self, i: usize, value: u32) -> StepResult {
        self.bars.overwrite(i, value);
        self.counters.swaps += 1;
        self.checkpoint()
    }

    /// Sort without visualization and without touching the counters.
    pub fn sort_instantly(&mut self) {
        self.bars.sort_instantly();
    }

    pub fn frame(&self) -> Frame {
        Frame {
            values: self.bars.snapshot(),
            highlight1: self.highlight1,
            highlight2: self.highlight2,
            comparisons: self.counters.comparisons,
            swaps: self.counters.swaps,
            delay_ms: self.pacer.delay_ms(),
            step: self.steps,
        }
    }

    /// Publish, sleep, then park while paused.
    pub fn checkpoint(&mut self) -> StepResult {
        self.ensure_running()?;
        self.steps += 1;
        self.publish()?;

        let delay = self.pacer.delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        self.wait_while_paused()?;
        self.ensure_running()
    }

    fn publish(&self) -> StepResult {
        if self.frames.is_closed() {
            return Err(Halt::Fault(anyhow::anyhow!(
                "presentation detached: frame receiver dropped"
            )));
        }
        self.frames.send_replace(self.frame());
        Ok(())
    }

    fn wait_while_paused(&self) -> StepResult {
        while self.flags.is_paused() {
            if self.flags.stop_requested() {
                return Err(Halt::Stopped);
            }
            if self.flags.take_step() {
                return Ok(());
            }
            std::thread::sleep(PAUSE_POLL);
        }
        Ok(())
    }

    /// Clear highlights, publish the closing frame and hand back the tallies.
    pub fn finish(mut self) -> Tally {
        self.highlight(None, None);
        if !self.frames.is_closed() {
            self.frames.send_replace(self.frame());
        }
        Tally {
            counters: self.counters,
            steps: self.steps,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::Harness;
    use super::*;

    #[test]
    fn checkpoint_publishes_frame_with_counters() {
        let h = Harness::new();
        let (_, res, tally) = h.run(vec![3, 1], |st| {
            if st.compare(0, 1)? == CmpOrdering::Greater {
                st.exchange(0, 1)?;
            }
            let frame = st.frame();
            assert_eq!(frame.highlight1, Some(0));
            assert_eq!(frame.highlight2, Some(1));
            Ok(())
        });
        assert!(res.is_ok());
        assert_eq!(tally.counters.comparisons, 1);
        assert_eq!(tally.counters.swaps, 1);
        assert_eq!(tally.steps, 2);

        let last = h.frame_rx.borrow().clone();
        assert_eq!(last.values, vec![1, 3]);
        assert_eq!(last.highlight1, None);
        assert_eq!(last.highlight2, None);
        assert_eq!(last.step, 2);
    }

    #[test]
    fn stop_flag_halts_at_next_checkpoint() {
        let h = Harness::new();
        h.flags.request_stop();
        let (values, res, tally) = h.run(vec![2, 1], |st| st.exchange(0, 1));
        assert!(matches!(res, Err(Halt::Stopped)));
        // the mutation happened but the checkpoint refused to continue
        assert_eq!(values, vec![1, 2]);
        assert_eq!(tally.steps, 0);
    }

    #[test]
    fn self_exchange_is_not_counted() {
        let h = Harness::new();
        let (_, res, tally) = h.run(vec![1, 2], |st| st.exchange(1, 1));
        assert!(res.is_ok());
        assert_eq!(tally.counters.swaps, 0);
        assert_eq!(tally.steps, 0);
    }

    #[test]
    fn dropped_receiver_is_a_fault() {
        let (frames, frame_rx) = watch::channel(Frame::default());
        drop(frame_rx);
        let flags = ExecFlags::new();
        let pacer = Pacer::unpaced(SpeedRange::default(), 30);
        let mut bars = Bars::from_values(vec![2, 1]);
        let mut st = Stepper::new(&mut bars, &flags, &pacer, &frames);
        assert!(matches!(st.compare(0, 1), Err(Halt::Fault(_))));
    }

    #[test]
    fn pacer_rereads_speed() {
        let pacer = Pacer::new(SpeedRange::default(), 30);
        assert_eq!(pacer.delay_ms(), 171);
        let shared = pacer.clone();
        assert_eq!(shared.set_speed(500), 200);
        assert_eq!(pacer.delay_ms(), 1);
        assert_eq!(Pacer::unpaced(SpeedRange::default(), 30).delay_ms(), 0);
    }

    #[test]
    fn resume_clears_pending_step() {
        let flags = ExecFlags::new();
        flags.set_paused(true);
        flags.request_step();
        flags.set_paused(false);
        assert!(!flags.take_step());
    }
}
