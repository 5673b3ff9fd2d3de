use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of bars in the visualized sequence.
pub const BAR_COUNT: usize = 60;
/// Smallest bar height produced by a shuffle.
pub const MIN_VALUE: u32 = 40;
/// Largest bar height produced by a shuffle.
pub const MAX_VALUE: u32 = 560;
/// Slider value used when nothing else is configured.
pub const DEFAULT_SPEED: u32 = 30;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    BubbleSort,
    SelectionSort,
    InsertionSort,
    QuickSort,
    MergeSort,
    HeapSort,
    LinearSearch,
    BinarySearch,
}

impl Algorithm {
    pub const ALL: [Algorithm; 8] = [
        Algorithm::BubbleSort,
        Algorithm::SelectionSort,
        Algorithm::InsertionSort,
        Algorithm::QuickSort,
        Algorithm::MergeSort,
        Algorithm::HeapSort,
        Algorithm::LinearSearch,
        Algorithm::BinarySearch,
    ];

    /// Human-readable name, as shown in the algorithm selector.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::BubbleSort => "Bubble Sort",
            Algorithm::SelectionSort => "Selection Sort",
            Algorithm::InsertionSort => "Insertion Sort",
            Algorithm::QuickSort => "Quick Sort",
            Algorithm::MergeSort => "Merge Sort",
            Algorithm::HeapSort => "Heap Sort",
            Algorithm::LinearSearch => "Linear Search",
            Algorithm::BinarySearch => "Binary Search",
        }
    }

    pub fn is_search(self) -> bool {
        matches!(self, Algorithm::LinearSearch | Algorithm::BinarySearch)
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|a| *a == self).unwrap_or(0)
    }

    /// Next entry in selector order, wrapping around.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous entry in selector order, wrapping around.
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = anyhow::Error;

    /// Accepts display names ("Bubble Sort") and kebab names ("bubble-sort"), case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .iter()
            .copied()
            .find(|a| {
                let name: String = a
                    .name()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                name == wanted
            })
            .ok_or_else(|| anyhow::anyhow!("unknown algorithm: {s:?}"))
    }
}

/// Bounds of the speed slider. Higher speed means a shorter per-step delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedRange {
    pub min: u32,
    pub max: u32,
}

impl Default for SpeedRange {
    fn default() -> Self {
        Self { min: 1, max: 200 }
    }
}

impl SpeedRange {
    pub fn clamp(&self, speed: u32) -> u32 {
        speed.clamp(self.min, self.max)
    }

    /// Per-step delay in milliseconds for a slider value: `max - speed + min`.
    pub fn delay_ms(&self, speed: u32) -> u64 {
        let speed = self.clamp(speed);
        u64::from(self.max - speed + self.min)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub algorithm: Algorithm,
    pub speed_range: SpeedRange,
    pub speed: u32,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Sleep between steps. Headless runs default to unpaced.
    pub paced: bool,
    pub run_on_launch: bool,
}

/// Running totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub comparisons: u64,
    pub swaps: u64,
}

/// Everything the presentation layer needs to draw one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub values: Vec<u32>,
    pub highlight1: Option<usize>,
    pub highlight2: Option<usize>,
    pub comparisons: u64,
    pub swaps: u64,
    pub delay_ms: u64,
    /// Checkpoints passed so far in the current run.
    pub step: u64,
}

impl Frame {
    /// A frame with no highlights and zeroed counters.
    pub fn idle(values: Vec<u32>, delay_ms: u64) -> Self {
        Self {
            values,
            delay_ms,
            ..Default::default()
        }
    }

    pub fn is_highlighted(&self, idx: usize) -> bool {
        self.highlight1 == Some(idx) || self.highlight2 == Some(idx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Completed,
    Stopped,
    Faulted,
}

impl RunOutcome {
    pub fn label(self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Stopped => "stopped",
            RunOutcome::Faulted => "faulted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub target: u32,
    pub index: Option<usize>,
    /// Whether the sequence was sorted before probing.
    pub presorted: bool,
}

impl SearchResult {
    pub fn to_message(&self) -> String {
        match self.index {
            Some(idx) => format!("Found {} at index {}", self.target, idx),
            None => format!("Target {} not found.", self.target),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default)]
    pub timestamp_utc: String,
    pub algorithm: Algorithm,
    pub outcome: RunOutcome,
    pub comparisons: u64,
    pub swaps: u64,
    pub steps: u64,
    pub elapsed_ms: u64,
    #[serde(default)]
    pub search: Option<SearchResult>,
    #[serde(default)]
    pub fault: Option<String>,
    pub final_values: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SortEvent {
    RunStarted {
        algorithm: Algorithm,
    },
    SearchStarted {
        target: u32,
        presorted: bool,
    },
    SearchFinished {
        result: SearchResult,
    },
    RunEnded {
        // Box to keep SortEvent small; the report carries the whole final sequence.
        report: Box<RunReport>,
    },
    Info(InfoEvent),
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Message(String),
    Shuffled,
    Paused,
    Resumed,
    Stepped,
    Stopping,
    Busy,
    SpeedChanged { speed: u32, delay_ms: u64 },
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::Shuffled => "Shuffled".to_string(),
            InfoEvent::Paused => "Paused".to_string(),
            InfoEvent::Resumed => "Resumed".to_string(),
            InfoEvent::Stepped => "Next step".to_string(),
            InfoEvent::Stopping => "Stopping…".to_string(),
            InfoEvent::Busy => "A run is already in progress".to_string(),
            InfoEvent::SpeedChanged { speed, delay_ms } => {
                format!("Speed {} (delay {} ms)", speed, delay_ms)
            }
        }
    }
}
