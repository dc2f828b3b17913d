//! File logging for the TUI.
//!
//! The terminal belongs to ratatui, so log lines go to a file instead:
//! `logging.file`, or `cadence.log` in the XDG state directory.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{LoggingSettings, default_state_dir};

/// Environment variable that overrides `logging.level`.
pub const LOG_ENV: &str = "CADENCE_LOG";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("no log file configured and no state directory could be determined")]
    NoStateDir,

    #[error("cannot open log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to install subscriber: {0}")]
    Install(String),
}

/// Where log output goes for `settings`.
pub fn log_path(settings: &LoggingSettings) -> Result<PathBuf, LoggingError> {
    match &settings.file {
        Some(p) => Ok(p.clone()),
        None => default_state_dir()
            .map(|d| d.join("cadence.log"))
            .ok_or(LoggingError::NoStateDir),
    }
}

fn filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&settings.level))
}

fn open_log(path: &Path) -> Result<File, LoggingError> {
    let open_err = |source| LoggingError::Open {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(open_err)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_err)
}

/// Install the global subscriber. Returns the log file path.
pub fn init(settings: &LoggingSettings) -> Result<PathBuf, LoggingError> {
    let path = log_path(settings)?;
    let file = open_log(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter(settings))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))?;

    tracing::info!(path = %path.display(), "logging initialised");
    Ok(path)
}
