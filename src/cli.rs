use crate::bars::Bars;
use crate::engine::{EngineControl, Pacer, RunOutput, SortEngine};
use crate::model::{
    Algorithm, Frame, RunConfig, RunOutcome, RunReport, SortEvent, SpeedRange, DEFAULT_SPEED,
};
use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "sortviz",
    version,
    about = "Sorting and searching algorithm visualizer with optional TUI"
)]
pub struct Cli {
    /// Algorithm to select on startup (and to run in text/JSON mode)
    #[arg(long, value_enum, default_value_t = Algorithm::BubbleSort)]
    pub algorithm: Algorithm,

    /// Initial speed; higher is faster (per-step delay = max - speed + min ms)
    #[arg(long, default_value_t = DEFAULT_SPEED)]
    pub speed: u32,

    /// Lowest selectable speed
    #[arg(long, default_value_t = 1)]
    pub min_speed: u32,

    /// Highest selectable speed
    #[arg(long, default_value_t = 200)]
    pub max_speed: u32,

    /// Seed for reproducible shuffles and search targets
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print JSON report and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Run silently: suppress all output except errors
    #[arg(long)]
    pub silent: bool,

    /// Honor the per-step delay in text/JSON mode
    #[arg(long)]
    pub paced: bool,

    /// Start the selected algorithm as soon as the TUI opens
    #[arg(long)]
    pub run_on_launch: bool,

    /// Write the log here instead of the cache directory
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,

    /// Log at debug level
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

pub async fn run(args: Cli) -> Result<()> {
    // Validate that --silent can only be used with --json
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }
    let cfg = build_config(&args)?;
    log::debug!("config: {}", serde_json::to_string(&cfg)?);

    // Silent mode takes precedence over other output modes
    if args.silent {
        return run_json(cfg, true).await;
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(cfg).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(cfg).await;
        }
    }

    if args.json {
        return run_json(cfg, false).await;
    }

    run_text(cfg).await
}

/// Build a `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> Result<RunConfig> {
    if args.min_speed == 0 || args.min_speed > args.max_speed {
        return Err(anyhow::anyhow!(
            "invalid speed range {}..={}: need 1 <= --min-speed <= --max-speed",
            args.min_speed,
            args.max_speed
        ));
    }
    let speed_range = SpeedRange {
        min: args.min_speed,
        max: args.max_speed,
    };
    if speed_range.clamp(args.speed) != args.speed {
        return Err(anyhow::anyhow!(
            "--speed {} is outside {}..={}",
            args.speed,
            speed_range.min,
            speed_range.max
        ));
    }
    Ok(RunConfig {
        algorithm: args.algorithm,
        speed_range,
        speed: args.speed,
        seed: args.seed,
        paced: args.paced,
        run_on_launch: args.run_on_launch,
    })
}

/// Run the configured algorithm once on a fresh sequence, without a presentation layer.
///
/// Every lifecycle event is handed to `on_event`. Ctrl-C stops the run at its next checkpoint.
async fn run_headless(cfg: RunConfig, mut on_event: impl FnMut(SortEvent)) -> Result<RunReport> {
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let bars = Bars::random(&mut rng);
    let pacer = if cfg.paced {
        Pacer::new(cfg.speed_range, cfg.speed)
    } else {
        Pacer::unpaced(cfg.speed_range, cfg.speed)
    };

    // Nobody draws frames here, but the receiver must stay open or the run faults.
    let (frame_tx, _frame_rx) = watch::channel(Frame::idle(bars.snapshot(), pacer.delay_ms()));
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<SortEvent>();
    let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel::<EngineControl>();

    let engine = SortEngine::new(cfg.algorithm, pacer, StdRng::seed_from_u64(rng.gen()));
    let mut handle = tokio::spawn(engine.run(bars, Arc::new(frame_tx), evt_tx, ctrl_rx));

    let mut events_open = true;
    let output: RunOutput = loop {
        tokio::select! {
            ev = evt_rx.recv(), if events_open => match ev {
                Some(ev) => on_event(ev),
                None => events_open = false,
            },
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupt received, stopping {}", cfg.algorithm);
                let _ = ctrl_tx.send(EngineControl::Stop);
            }
            res = &mut handle => break res.context("sort engine task failed")?,
        }
    };
    // Events sent just before the run ended.
    while let Ok(ev) = evt_rx.try_recv() {
        on_event(ev);
    }
    Ok(output.report)
}

/// Run once and print the report as JSON.
/// `silent` suppresses all output; a failed run still surfaces as an error.
async fn run_json(cfg: RunConfig, silent: bool) -> Result<()> {
    let report = run_headless(cfg, |_| {}).await?;

    if report.outcome == RunOutcome::Faulted {
        return Err(anyhow::anyhow!(
            "{} failed: {}",
            report.algorithm,
            report.fault.as_deref().unwrap_or("unknown fault")
        ));
    }
    if silent {
        return Ok(());
    }

    let (out_tx, out_handle) = spawn_output_writer();
    let out = serde_json::to_string_pretty(&report)?;
    let _ = out_tx.send(OutputLine::Stdout(out));
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

async fn run_text(cfg: RunConfig) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();

    let stderr_tx = out_tx.clone();
    let report = run_headless(cfg, move |ev| {
        let line = match ev {
            SortEvent::RunStarted { algorithm } => Some(format!("== {algorithm} ==")),
            SortEvent::SearchStarted { target, presorted } => Some(if presorted {
                format!("Sorted sequence; searching for {target}")
            } else {
                format!("Searching for {target}")
            }),
            SortEvent::Info(info) => Some(info.to_message()),
            SortEvent::SearchFinished { .. } | SortEvent::RunEnded { .. } => None,
        };
        if let Some(line) = line {
            let _ = stderr_tx.send(OutputLine::Stderr(line));
        }
    })
    .await?;

    let summary = crate::text_summary::build_text_summary(&report)?;
    for line in summary.lines {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["sortviz"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_build_a_valid_config() {
        let cfg = build_config(&parse(&[])).unwrap();
        assert_eq!(cfg.algorithm, Algorithm::BubbleSort);
        assert_eq!(cfg.speed, 30);
        assert_eq!(cfg.speed_range, SpeedRange::default());
        assert!(!cfg.paced);
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn algorithm_flag_uses_kebab_names() {
        let cfg = build_config(&parse(&["--algorithm", "heap-sort", "--seed", "9"])).unwrap();
        assert_eq!(cfg.algorithm, Algorithm::HeapSort);
        assert_eq!(cfg.seed, Some(9));
    }

    #[test]
    fn speed_outside_range_is_rejected() {
        assert!(build_config(&parse(&["--speed", "500"])).is_err());
        assert!(build_config(&parse(&["--min-speed", "0"])).is_err());
        assert!(build_config(&parse(&["--min-speed", "50", "--max-speed", "10"])).is_err());
        assert!(build_config(&parse(&["--speed", "10", "--min-speed", "10"])).is_ok());
    }

    #[tokio::test]
    async fn silent_requires_json() {
        let err = run(parse(&["--silent"])).await.unwrap_err();
        assert!(err.to_string().contains("--silent"));
    }

    #[tokio::test]
    async fn headless_run_is_reproducible_with_seed() {
        let cfg = build_config(&parse(&["--algorithm", "quick-sort", "--seed", "42"])).unwrap();
        let mut started = 0;
        let first = run_headless(cfg.clone(), |ev| {
            if matches!(ev, SortEvent::RunStarted { .. }) {
                started += 1;
            }
        })
        .await
        .unwrap();
        assert_eq!(started, 1);
        assert_eq!(first.outcome, RunOutcome::Completed);
        assert!(first.final_values.windows(2).all(|w| w[0] <= w[1]));

        let second = run_headless(cfg, |_| {}).await.unwrap();
        assert_eq!(first.final_values, second.final_values);
        assert_eq!(first.comparisons, second.comparisons);
        assert_eq!(first.swaps, second.swaps);
    }
}
