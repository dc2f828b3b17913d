//! Error types for the playback controller.

use thiserror::Error;

/// Coarse classification callers can branch on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The command carried an argument the controller refuses to forward.
    InvalidArgument,
    /// The player (or its engine) is not running.
    Unavailable,
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("track index {index} is out of range for a playlist of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("seek fraction must be a finite number, got {0}")]
    InvalidFraction(f32),

    #[error("player thread is not running")]
    Disconnected,

    #[error("media engine failed to start: {0}")]
    EngineInit(String),

    #[error("failed to spawn player thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl PlayerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IndexOutOfRange { .. } | Self::InvalidFraction(_) => ErrorKind::InvalidArgument,
            Self::Disconnected | Self::EngineInit(_) | Self::Spawn(_) => ErrorKind::Unavailable,
        }
    }
}
