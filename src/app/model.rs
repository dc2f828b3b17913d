//! The `App` model: catalog, cursor and follow-playback behaviour.

use crate::library::Track;
use crate::player::PlaybackState;

use super::now_playing::NowPlaying;

pub struct App {
    pub tracks: Vec<Track>,
    pub selected: usize,
    pub now_playing: NowPlaying,

    /// When set, the cursor jumps to the track the player reports as current.
    pub follow_playback: bool,
    pub current_dir: Option<String>,
}

impl App {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            selected: 0,
            now_playing: NowPlaying::default(),
            follow_playback: true,
            current_dir: None,
        }
    }

    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = Some(dir);
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    /// Fold a state from the player into the view.
    pub fn apply(&mut self, state: &PlaybackState) {
        self.now_playing.apply(state, self.tracks.len());
        if let PlaybackState::CurrentTrack { index } = state {
            if self.follow_playback && *index < self.tracks.len() {
                self.selected = *index;
            }
        }
    }

    /// The track the player reports as current.
    pub fn current_track(&self) -> Option<&Track> {
        self.now_playing.current.and_then(|i| self.tracks.get(i))
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    /// Move the cursor down, wrapping at the end.
    pub fn next(&mut self) {
        if self.has_tracks() {
            self.selected = (self.selected + 1) % self.tracks.len();
        }
    }

    /// Move the cursor up, wrapping at the start.
    pub fn prev(&mut self) {
        if self.has_tracks() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.tracks.len() - 1);
        }
    }

    pub fn first(&mut self) {
        self.selected = 0;
    }

    pub fn last(&mut self) {
        self.selected = self.tracks.len().saturating_sub(1);
    }

    /// Shift the progress bar by `delta` (a fraction of the track) and
    /// return the new absolute fraction to seek to.
    pub fn scrub(&mut self, delta: f32) -> f32 {
        let target = (self.now_playing.ratio() as f32 + delta).clamp(0.0, 1.0);
        self.now_playing.preview_fraction(target);
        target
    }
}
