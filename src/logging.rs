//! File logging.
//!
//! The TUI owns the terminal, so log records always go to a file.

use anyhow::{Context, Result};
use simplelog::{Config, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::{Path, PathBuf};

/// `<cache dir>/sortviz/sortviz.log`, falling back to the working directory.
pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sortviz")
        .join("sortviz.log")
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

/// Install the global logger. Failure is reported on stderr and otherwise ignored.
pub fn init_logging(path: Option<&Path>, verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_log_path);

    let file = match open_log_file(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("logging disabled: {e:#}");
            return;
        }
    };
    if let Err(e) = WriteLogger::init(level, Config::default(), file) {
        eprintln!("logging disabled: {e}");
        return;
    }

    log::info!(
        "sortviz {} starting (log level: {:?})",
        env!("CARGO_PKG_VERSION"),
        level
    );
}
