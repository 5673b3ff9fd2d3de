//! Run lifecycle controller.
//!
//! Owns shuffle/run/stop orchestration and emits events for presentation layers.
//! The sequence lives here between runs and is lent to exactly one engine run at a time.

use super::post_process::{process_run_completion, recover_output};
use crate::bars::Bars;
use crate::engine::{EngineControl, FrameTx, Pacer, RunOutput, SortEngine};
use crate::model::{Algorithm, Frame, InfoEvent, RunConfig, SortEvent};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::Duration;

/// Commands emitted by UI layers to control the visualizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UiCommand {
    Shuffle,
    Run(Algorithm),
    Stop,
    Pause,
    Resume,
    Step,
    SetSpeed(u32),
    Quit,
}

/// Internal handle for a running algorithm.
struct RunCtx {
    algorithm: Algorithm,
    ctrl_tx: UnboundedSender<EngineControl>,
    handle: Option<tokio::task::JoinHandle<RunOutput>>,
    /// Pre-run sequence, restored if the run task is lost.
    fallback: Vec<u32>,
}

/// Spawn a new run and return its control handle.
fn start_run(
    algorithm: Algorithm,
    bars: Bars,
    pacer: &Pacer,
    rng: &mut StdRng,
    frame_tx: &FrameTx,
    event_tx: &UnboundedSender<SortEvent>,
) -> RunCtx {
    let (ctrl_tx, ctrl_rx) = tokio::sync::mpsc::unbounded_channel::<EngineControl>();
    let fallback = bars.snapshot();
    let engine = SortEngine::new(algorithm, pacer.clone(), StdRng::seed_from_u64(rng.gen()));
    let frame_tx = frame_tx.clone();
    let event_tx = event_tx.clone();
    let handle = tokio::spawn(async move { engine.run(bars, frame_tx, event_tx, ctrl_rx).await });
    RunCtx {
        algorithm,
        ctrl_tx,
        handle: Some(handle),
        fallback,
    }
}

fn info(event_tx: &UnboundedSender<SortEvent>, info: InfoEvent) {
    let _ = event_tx.send(SortEvent::Info(info));
}

/// Orchestrate runs based on UI commands and emit events back to presentation layers.
pub(crate) async fn run_controller(
    cfg: RunConfig,
    pacer: Pacer,
    frame_tx: FrameTx,
    event_tx: UnboundedSender<SortEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    // None while an engine run owns the sequence.
    let mut bars = Some(Bars::random(&mut rng));
    if let Some(b) = &bars {
        frame_tx.send_replace(Frame::idle(b.snapshot(), pacer.delay_ms()));
    }

    let mut run_ctx: Option<RunCtx> = None;
    if cfg.run_on_launch {
        if let Some(b) = bars.take() {
            run_ctx = Some(start_run(
                cfg.algorithm,
                b,
                &pacer,
                &mut rng,
                &frame_tx,
                &event_tx,
            ));
        }
    }
    let mut quit_pending = false;
    let mut cmd_open = true;
    // Stop watchdog: if a stop takes too long, emit a status message to keep UI feedback alive.
    let mut stop_deadline: Option<tokio::time::Instant> = None;
    let mut watchdog = tokio::time::interval(Duration::from_millis(500));

    loop {
        tokio::select! {
            cmd = cmd_rx.recv(), if cmd_open => {
                match cmd {
                    Some(UiCommand::Shuffle) => {
                        match bars.as_mut() {
                            Some(b) if run_ctx.is_none() => {
                                b.randomize(&mut rng);
                                frame_tx.send_replace(Frame::idle(b.snapshot(), pacer.delay_ms()));
                                info(&event_tx, InfoEvent::Shuffled);
                            }
                            _ => info(&event_tx, InfoEvent::Busy),
                        }
                    }
                    Some(UiCommand::Run(algorithm)) => {
                        // Runs are serialized: a new run only starts once the sequence is back.
                        match (run_ctx.is_none(), bars.take()) {
                            (true, Some(b)) => {
                                run_ctx = Some(start_run(algorithm, b, &pacer, &mut rng, &frame_tx, &event_tx));
                            }
                            (_, taken) => {
                                bars = taken;
                                log::debug!("ignoring run of {algorithm}: a run is active");
                                info(&event_tx, InfoEvent::Busy);
                            }
                        }
                    }
                    Some(UiCommand::Stop) => {
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Stop);
                            info(&event_tx, InfoEvent::Stopping);
                            stop_deadline = Some(tokio::time::Instant::now() + Duration::from_secs(3));
                        }
                    }
                    Some(UiCommand::Pause) => {
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Pause(true));
                            info(&event_tx, InfoEvent::Paused);
                        }
                    }
                    Some(UiCommand::Resume) => {
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Pause(false));
                            info(&event_tx, InfoEvent::Resumed);
                        }
                    }
                    Some(UiCommand::Step) => {
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Step);
                            info(&event_tx, InfoEvent::Stepped);
                        }
                    }
                    Some(UiCommand::SetSpeed(speed)) => {
                        let speed = pacer.set_speed(speed);
                        let delay_ms = pacer.delay_ms();
                        if run_ctx.is_none() {
                            frame_tx.send_modify(|f| f.delay_ms = delay_ms);
                        }
                        info(&event_tx, InfoEvent::SpeedChanged { speed, delay_ms });
                    }
                    Some(UiCommand::Quit) | None => {
                        cmd_open = cmd.is_some();
                        if quit_pending {
                            continue;
                        }
                        // Quit waits for the current run to finish so the worker winds down cleanly.
                        quit_pending = true;
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Stop);
                            info(&event_tx, InfoEvent::Stopping);
                            stop_deadline = Some(tokio::time::Instant::now() + Duration::from_secs(3));
                        } else {
                            break Ok(());
                        }
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            maybe_done = async {
                if let Some(ctx) = &mut run_ctx {
                    if let Some(h) = ctx.handle.as_mut() {
                        return Some(h.await);
                    }
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    let Some(ctx) = run_ctx.take() else { continue };
                    let output = match join_res {
                        Ok(out) => out,
                        Err(e) => {
                            log::error!("run task for {} failed: {e}", ctx.algorithm);
                            recover_output(ctx.algorithm, ctx.fallback, format!("run join failed: {e}"))
                        }
                    };

                    let processed = process_run_completion(output, &mut rng);
                    if processed.reshuffled {
                        frame_tx.send_replace(Frame::idle(processed.bars.snapshot(), pacer.delay_ms()));
                    }
                    for msg in processed.messages {
                        info(&event_tx, InfoEvent::Message(msg));
                    }
                    let _ = event_tx.send(SortEvent::RunEnded { report: Box::new(processed.report) });
                    bars = Some(processed.bars);
                    stop_deadline = None;
                    if quit_pending {
                        break Ok(());
                    }
                }
            }
            // If a stop stalls (e.g. a very long delay), keep the user informed.
            _ = watchdog.tick() => {
                if let Some(deadline) = stop_deadline {
                    if tokio::time::Instant::now() >= deadline && run_ctx.is_some() {
                        info(&event_tx, InfoEvent::Message("Still stopping…".into()));
                        stop_deadline = None;
                    }
                }
            }
        }
    }
}
