mod charts;
mod help;
mod state;

use crate::engine::Pacer;
use crate::model::{Algorithm, Frame, RunConfig, SortEvent};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Color,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Terminal,
};
use state::{KeyAction, UiState, TAB_VISUALIZER};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::{mpsc, watch};

pub async fn run(cfg: RunConfig) -> Result<()> {
    // Unbounded channels avoid backpressure and task switching in the hot path.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<SortEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    // Frames coalesce: the UI only ever needs the latest one.
    let (frame_tx, frame_rx) = watch::channel(Frame::default());
    // Held until shutdown so a run winding down after the UI exits does not see a detached receiver.
    let _frame_keepalive = frame_tx.subscribe();

    let pacer = Pacer::new(cfg.speed_range, cfg.speed);

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_cfg = cfg.clone();
    let ui_handle =
        std::thread::spawn(move || run_threaded(ui_cfg, frame_rx, event_rx, cmd_tx));

    let res =
        orchestrator::run_controller(cfg, pacer, Arc::new(frame_tx), event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    cfg: RunConfig,
    frame_rx: watch::Receiver<Frame>,
    mut event_rx: UnboundedReceiver<SortEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState::from_config(&cfg);

    let tick_rate = Duration::from_millis(33);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive; unbounded channel avoids backpressure.
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            let frame = frame_rx.borrow().clone();
            terminal.draw(|f| draw(f.area(), f, &state, &frame)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match state.on_key(k.modifiers, k.code) {
                    KeyAction::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    KeyAction::Send(cmd) => {
                        log::debug!("ui command: {cmd:?}");
                        if cmd_tx.send(cmd).is_err() {
                            break Err(anyhow::anyhow!("controller stopped unexpectedly"));
                        }
                    }
                    KeyAction::None => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState, frame: &Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Visualizer"), Line::from("Help")])
        .select(state.tab)
        .block(Block::default().borders(Borders::ALL).title("sortviz"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        TAB_VISUALIZER => draw_visualizer(chunks[1], f, state, frame),
        _ => help::draw_help(chunks[1], f),
    }
}

fn draw_visualizer(area: Rect, f: &mut ratatui::Frame, state: &UiState, frame: &Frame) {
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(6), // Algorithm, counters, message, last run
                Constraint::Min(0),    // Bars
                Constraint::Length(4), // Selector + status
            ]
            .as_ref(),
        )
        .split(area);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Algorithm: ", Style::default().fg(Color::Gray)),
            Span::styled(
                state.selected.name(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(format!(
            "Comparisons: {} | Swaps: {} | Delay: {} ms",
            frame.comparisons, frame.swaps, frame.delay_ms
        )),
        Line::from(Span::styled(
            state.info.clone(),
            Style::default().fg(Color::Cyan),
        )),
    ];
    if let Some(r) = &state.last_report {
        lines.push(Line::from(Span::styled(
            format!(
                "Last run: {} {} after {} steps ({} ms)",
                r.algorithm,
                r.outcome.label(),
                r.steps,
                r.elapsed_ms
            ),
            Style::default().fg(Color::DarkGray),
        )));
    }
    let info = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Info"));
    f.render_widget(info, main[0]);

    let title = if frame.step > 0 {
        format!("{} values, step {}", frame.values.len(), frame.step)
    } else {
        format!("{} values", frame.values.len())
    };
    charts::draw_bars(main[1], f, frame, &title);

    let status_color = match state.status_label() {
        "Running" => Color::Green,
        "Paused" => Color::Yellow,
        _ => Color::Gray,
    };
    let status = Paragraph::new(vec![
        selector_line(state.selected, state.running),
        Line::from(vec![
            Span::styled(state.status_label(), Style::default().fg(status_color)),
            Span::raw(format!(
                "  Speed: {} ({}-{})  ",
                state.speed, state.speed_range.min, state.speed_range.max
            )),
            Span::styled(
                "Enter run · s shuffle · x stop · p/c pause/resume · n step · +/- speed · ? help",
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, main[2]);
}

/// One span per algorithm, the selected one highlighted. Dimmed while a run owns the selection.
fn selector_line(selected: Algorithm, locked: bool) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, a) in Algorithm::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *a == selected {
            let s = Style::default().add_modifier(Modifier::BOLD);
            if locked {
                s.fg(Color::DarkGray)
            } else {
                s.fg(Color::Yellow)
            }
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!("{} {}", i + 1, a.name()), style));
    }
    Line::from(spans)
}
