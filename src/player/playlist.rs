use std::sync::Arc;

use crate::library::Track;

use super::error::PlayerError;

/// The ordered items handed to the engine, plus the index last confirmed
/// by the engine.
#[derive(Debug, Clone, Default)]
pub(super) struct Playlist {
    tracks: Arc<[Track]>,
    current: Option<usize>,
}

impl Playlist {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks: tracks.into(),
            current: None,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn validate(&self, index: usize) -> Result<usize, PlayerError> {
        if index < self.len() {
            Ok(index)
        } else {
            Err(PlayerError::IndexOutOfRange {
                index,
                len: self.len(),
            })
        }
    }

    /// Adopt the engine's index; out-of-range reports are ignored.
    pub fn sync_current(&mut self, index: usize) {
        if index < self.len() {
            self.current = Some(index);
        }
    }
}
