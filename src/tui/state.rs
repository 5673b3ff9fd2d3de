use crate::model::{Algorithm, InfoEvent, RunConfig, RunReport, SortEvent, SpeedRange};
use crate::orchestrator::UiCommand;
use crossterm::event::{KeyCode, KeyModifiers};

/// Speed slider increment for `+` / `-`.
pub const SPEED_STEP: u32 = 5;

pub const TAB_VISUALIZER: usize = 0;
pub const TAB_HELP: usize = 1;
pub const TAB_COUNT: usize = 2;

/// What a key press asks of the UI loop.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum KeyAction {
    None,
    Send(UiCommand),
    Quit,
}

#[derive(Debug, Clone)]
pub(crate) struct UiState {
    pub tab: usize,
    pub selected: Algorithm,
    pub running: bool,
    pub paused: bool,
    pub speed: u32,
    pub speed_range: SpeedRange,
    pub info: String,
    pub last_report: Option<RunReport>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: TAB_VISUALIZER,
            selected: Algorithm::BubbleSort,
            running: false,
            paused: false,
            speed: crate::model::DEFAULT_SPEED,
            speed_range: SpeedRange::default(),
            info: String::new(),
            last_report: None,
        }
    }
}

impl UiState {
    pub fn from_config(cfg: &RunConfig) -> Self {
        Self {
            selected: cfg.algorithm,
            speed: cfg.speed,
            speed_range: cfg.speed_range,
            info: "Press Enter to run, s to shuffle, ? for help".into(),
            ..Default::default()
        }
    }

    pub fn status_label(&self) -> &'static str {
        match (self.running, self.paused) {
            (true, true) => "Paused",
            (true, false) => "Running",
            (false, _) => "Idle",
        }
    }

    /// Map a key press to a command. Keys that make no sense in the current state are ignored.
    pub fn on_key(&mut self, modifiers: KeyModifiers, code: KeyCode) -> KeyAction {
        match (modifiers, code) {
            (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                KeyAction::Quit
            }
            (_, KeyCode::Tab) => {
                self.tab = (self.tab + 1) % TAB_COUNT;
                KeyAction::None
            }
            (_, KeyCode::Char('?')) => {
                self.tab = TAB_HELP;
                KeyAction::None
            }
            (_, KeyCode::Char('s')) if !self.running => KeyAction::Send(UiCommand::Shuffle),
            (_, KeyCode::Enter) | (_, KeyCode::Char('r')) if !self.running => {
                self.tab = TAB_VISUALIZER;
                KeyAction::Send(UiCommand::Run(self.selected))
            }
            (_, KeyCode::Char('x')) if self.running => KeyAction::Send(UiCommand::Stop),
            (_, KeyCode::Char('p')) if self.running && !self.paused => {
                self.paused = true;
                KeyAction::Send(UiCommand::Pause)
            }
            (_, KeyCode::Char('c')) if self.running && self.paused => {
                self.paused = false;
                KeyAction::Send(UiCommand::Resume)
            }
            (_, KeyCode::Char('n')) if self.running && self.paused => {
                KeyAction::Send(UiCommand::Step)
            }
            (_, KeyCode::Char('+')) | (_, KeyCode::Char('=')) => {
                self.change_speed(self.speed.saturating_add(SPEED_STEP))
            }
            (_, KeyCode::Char('-')) => self.change_speed(self.speed.saturating_sub(SPEED_STEP)),
            (_, KeyCode::Left) | (_, KeyCode::Char('h')) if !self.running => {
                self.selected = self.selected.prev();
                KeyAction::None
            }
            (_, KeyCode::Right) | (_, KeyCode::Char('l')) if !self.running => {
                self.selected = self.selected.next();
                KeyAction::None
            }
            (_, KeyCode::Char(d @ '1'..='8')) if !self.running => {
                let idx = (d as usize) - ('1' as usize);
                self.selected = Algorithm::ALL[idx];
                KeyAction::None
            }
            _ => KeyAction::None,
        }
    }

    fn change_speed(&mut self, wanted: u32) -> KeyAction {
        let speed = self.speed_range.clamp(wanted);
        if speed == self.speed {
            return KeyAction::None;
        }
        self.speed = speed;
        KeyAction::Send(UiCommand::SetSpeed(speed))
    }

    pub fn apply_event(&mut self, ev: SortEvent) {
        match ev {
            SortEvent::RunStarted { algorithm } => {
                self.running = true;
                self.selected = algorithm;
                self.info = format!("Running {algorithm}…");
            }
            SortEvent::SearchStarted { target, presorted } => {
                self.info = if presorted {
                    format!("Sorted first; searching for {target}")
                } else {
                    format!("Searching for {target}")
                };
            }
            SortEvent::SearchFinished { result } => {
                self.info = result.to_message();
            }
            SortEvent::RunEnded { report } => {
                self.running = false;
                self.paused = false;
                self.last_report = Some(*report);
            }
            SortEvent::Info(info) => {
                match &info {
                    InfoEvent::Paused => self.paused = true,
                    InfoEvent::Resumed => self.paused = false,
                    InfoEvent::SpeedChanged { speed, .. } => self.speed = *speed,
                    _ => {}
                }
                self.info = info.to_message();
            }
        }
    }
}
