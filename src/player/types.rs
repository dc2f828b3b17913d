//! Commands, callbacks and state facts exchanged with the controller.

/// One fact on the state stream.
///
/// Each variant updates a single dimension (duration, transport flag,
/// active index, position). Observers merge them into their own view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    /// No playlist has been loaded yet.
    Initial,
    /// The engine prepared the current item; `duration_ms` is authoritative.
    Ready { duration_ms: u64 },
    /// The engine stalled; `position_ms` is the last known position.
    Buffering { position_ms: u64 },
    /// Transport status changed.
    Playing { is_playing: bool },
    /// The active playlist index changed.
    CurrentTrack { index: usize },
    /// Periodic position sample while playing.
    Progress { position_ms: u64 },
    /// The engine could not prepare the item at `index`.
    Failed { index: usize, reason: String },
}

/// A user-issued transport command. Consumed exactly once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    PlayPause,
    Stop,
    SelectTrack(usize),
    SeekToPrevious,
    SeekToNext,
    SeekBackwardRelative,
    SeekForwardRelative,
    /// Absolute seek to a fraction (0..=1) of the current duration.
    SeekToFraction(f32),
    /// Live drag of the progress bar; same target computation as `SeekToFraction`.
    ScrubProgress(f32),
}

/// Lifecycle callbacks raised by a `MediaEngine`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    BufferingStarted,
    Ready,
    Ended,
    Idle,
    PlayingChanged(bool),
    /// The current item or the item set changed.
    TracksChanged,
    Error { index: usize, reason: String },
}
