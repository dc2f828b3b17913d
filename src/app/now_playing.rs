use crate::player::{PlaybackState, format_timestamp, percentage};

/// Whether a track has been prepared since the last reset.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum UiState {
    #[default]
    Initial,
    Ready,
}

/// Observer-side view of playback, built by folding `PlaybackState`s.
#[derive(Clone, Debug, PartialEq)]
pub struct NowPlaying {
    pub ui_state: UiState,
    pub duration_ms: u64,
    pub position_ms: u64,
    /// Percentage (0..=100) of the track played.
    pub progress: f32,
    pub progress_text: String,
    pub is_playing: bool,
    pub current: Option<usize>,
    pub last_error: Option<String>,
}

impl Default for NowPlaying {
    fn default() -> Self {
        Self {
            ui_state: UiState::Initial,
            duration_ms: 0,
            position_ms: 0,
            progress: 0.0,
            progress_text: format_timestamp(Some(0)),
            is_playing: false,
            current: None,
            last_error: None,
        }
    }
}

impl NowPlaying {
    /// Fold one state into the view. `catalog_len` bounds `CurrentTrack`.
    pub fn apply(&mut self, state: &PlaybackState, catalog_len: usize) {
        match state {
            PlaybackState::Initial => *self = Self::default(),
            PlaybackState::Ready { duration_ms } => {
                self.duration_ms = *duration_ms;
                self.ui_state = UiState::Ready;
                self.set_position(self.position_ms);
            }
            PlaybackState::Buffering { position_ms } | PlaybackState::Progress { position_ms } => {
                self.set_position(*position_ms);
            }
            PlaybackState::Playing { is_playing } => self.is_playing = *is_playing,
            PlaybackState::CurrentTrack { index } => {
                if *index < catalog_len {
                    self.current = Some(*index);
                    self.last_error = None;
                }
            }
            PlaybackState::Failed { index, reason } => {
                self.last_error = Some(format!("track {}: {reason}", index + 1));
            }
        }
    }

    /// Move the bar locally ahead of the engine confirming the seek.
    pub fn preview_fraction(&mut self, fraction: f32) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.progress = fraction * 100.0;
        let position_ms = (self.duration_ms as f64 * fraction as f64) as u64;
        self.progress_text = format_timestamp(Some(position_ms));
    }

    /// Played fraction (0..=1) for gauges.
    pub fn ratio(&self) -> f64 {
        (self.progress as f64 / 100.0).clamp(0.0, 1.0)
    }

    pub fn duration_text(&self) -> String {
        format_timestamp((self.duration_ms > 0).then_some(self.duration_ms))
    }

    fn set_position(&mut self, position_ms: u64) {
        self.position_ms = position_ms;
        self.progress = percentage(position_ms, self.duration_ms);
        self.progress_text = format_timestamp(Some(position_ms));
    }
}
