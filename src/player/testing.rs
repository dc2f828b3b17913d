//! In-memory engine and session doubles.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::{Receiver, unbounded};

use crate::library::Track;

use super::engine::{EngineListener, MediaEngine};
use super::session::SessionHost;
use super::thread::Inbox;
use super::types::EngineEvent;

/// Engine callbacks captured by a listener that is not wired to a controller.
pub struct RecordedEvents {
    rx: Receiver<Inbox>,
}

impl RecordedEvents {
    /// Everything emitted since the last call.
    pub fn take(&self) -> Vec<EngineEvent> {
        self.rx
            .try_iter()
            .filter_map(|msg| match msg {
                Inbox::Engine(event) => Some(event),
                _ => None,
            })
            .collect()
    }
}

pub fn recording_listener() -> (EngineListener, RecordedEvents) {
    let (tx, rx) = unbounded();
    (EngineListener::new(tx), RecordedEvents { rx })
}

pub fn tracks(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| Track {
            id: i as u64,
            path: PathBuf::from(format!("/music/{i:02}.flac")),
            display_name: format!("Track {i}"),
            title: format!("Track {i}"),
            artist: None,
            duration_ms: 180_000,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Prepare(usize),
    Play,
    Pause,
    Stop,
    Seek(u64),
    SeekBack,
    SeekForward,
    SeekToIndex(usize),
    SeekToPrevious,
    SeekToNext,
    PlayWhenReady(bool),
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub calls: Vec<EngineCall>,
    pub playing: bool,
    pub index: Option<usize>,
    pub len: usize,
    pub position_ms: u64,
    pub duration_ms: Option<u64>,
    /// Added to the position every time it is sampled while playing.
    pub advance_ms: u64,
    /// Items that fail to load, reported like a real engine would.
    pub broken: Vec<usize>,
    /// The current item failed to load.
    pub failed: bool,
}

/// Scriptable engine. With a listener attached it raises callbacks the way
/// a real engine would; without one the test drives callbacks by hand.
pub struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
    listener: Option<EngineListener>,
}

impl FakeEngine {
    pub fn new() -> (Self, Arc<Mutex<FakeState>>) {
        let state = Arc::new(Mutex::new(FakeState {
            duration_ms: Some(180_000),
            ..FakeState::default()
        }));
        (
            Self {
                state: state.clone(),
                listener: None,
            },
            state,
        )
    }

    pub fn with_listener(mut self, listener: EngineListener) -> Self {
        self.listener = Some(listener);
        self
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: EngineCall) {
        self.state().calls.push(call);
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(l) = &self.listener {
            l.emit(event);
        }
    }

    fn set_playing(&self, playing: bool) {
        let changed = {
            let mut s = self.state();
            let changed = s.playing != playing;
            s.playing = playing;
            changed
        };
        if changed {
            self.emit(EngineEvent::PlayingChanged(playing));
        }
    }

    fn move_to(&self, index: usize) {
        let broken = {
            let mut s = self.state();
            s.index = Some(index);
            s.position_ms = 0;
            s.failed = s.broken.contains(&index);
            if s.failed {
                s.playing = false;
            }
            s.failed
        };
        if broken {
            self.emit(EngineEvent::BufferingStarted);
            self.emit(EngineEvent::Error {
                index,
                reason: "cannot decode".into(),
            });
            self.emit(EngineEvent::PlayingChanged(false));
            self.emit(EngineEvent::Idle);
        }
        self.emit(EngineEvent::TracksChanged);
    }

    /// Start playback unless the current item failed to load.
    fn resume(&self) {
        if self.state().failed {
            self.emit(EngineEvent::PlayingChanged(false));
        } else {
            self.set_playing(true);
        }
    }
}

impl MediaEngine for FakeEngine {
    fn prepare(&mut self, tracks: &[Track]) {
        self.record(EngineCall::Prepare(tracks.len()));
        {
            let mut s = self.state();
            s.len = tracks.len();
            s.index = if tracks.is_empty() { None } else { Some(0) };
            s.position_ms = 0;
            s.failed = false;
        }
        if tracks.is_empty() {
            self.emit(EngineEvent::Idle);
            return;
        }
        self.emit(EngineEvent::BufferingStarted);
        self.emit(EngineEvent::Ready);
        self.emit(EngineEvent::TracksChanged);
    }

    fn play(&mut self) {
        self.record(EngineCall::Play);
        self.resume();
    }

    fn pause(&mut self) {
        self.record(EngineCall::Pause);
        self.set_playing(false);
    }

    fn stop(&mut self) {
        self.record(EngineCall::Stop);
        self.set_playing(false);
        self.emit(EngineEvent::Idle);
    }

    fn seek(&mut self, position_ms: u64) {
        self.record(EngineCall::Seek(position_ms));
        self.state().position_ms = position_ms;
    }

    fn seek_back(&mut self) {
        self.record(EngineCall::SeekBack);
    }

    fn seek_forward(&mut self) {
        self.record(EngineCall::SeekForward);
    }

    fn seek_to_index(&mut self, index: usize) {
        self.record(EngineCall::SeekToIndex(index));
        self.move_to(index);
    }

    fn seek_to_previous(&mut self) {
        self.record(EngineCall::SeekToPrevious);
        let prev = self.state().index.map(|i| i.saturating_sub(1));
        if let Some(i) = prev {
            self.move_to(i);
        }
    }

    fn seek_to_next(&mut self) {
        self.record(EngineCall::SeekToNext);
        let next = {
            let s = self.state();
            s.index.map(|i| i + 1).filter(|i| *i < s.len)
        };
        if let Some(i) = next {
            self.move_to(i);
        }
    }

    fn set_play_when_ready(&mut self, play: bool) {
        self.record(EngineCall::PlayWhenReady(play));
        if play {
            self.resume();
        } else {
            self.set_playing(false);
        }
    }

    fn current_position(&self) -> u64 {
        let mut s = self.state();
        if s.playing {
            s.position_ms += s.advance_ms;
        }
        s.position_ms
    }

    fn current_index(&self) -> Option<usize> {
        self.state().index
    }

    fn is_playing(&self) -> bool {
        self.state().playing
    }

    fn duration(&self) -> Option<u64> {
        self.state().duration_ms
    }
}

#[derive(Default)]
pub struct FakeSession {
    pub starts: Arc<AtomicUsize>,
}

impl SessionHost for FakeSession {
    fn ensure_started(&mut self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }
}
