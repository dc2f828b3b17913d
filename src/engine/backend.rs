use tracing::{debug, info, warn};

use crate::config::PlayerSettings;
use crate::library::Track;
use crate::player::{EngineEvent, EngineListener, MediaEngine};

use super::EngineError;
use super::navigation::{PreviousTarget, next_index, previous_target, relative_target};
use super::sink::{DeviceOutput, ItemSink, Output};

/// Plays a queue of local files through the default output device.
pub type RodioEngine = QueueEngine<DeviceOutput>;

impl RodioEngine {
    pub fn open(listener: EngineListener, settings: PlayerSettings) -> Result<Self, EngineError> {
        Ok(QueueEngine::new(DeviceOutput::open_default()?, listener, settings))
    }
}

/// A queue of items played one at a time through `O`.
///
/// One sink holds the current item. End of item is detected from
/// `service`, which the controller thread calls while idle.
pub struct QueueEngine<O: Output> {
    output: O,
    listener: EngineListener,
    settings: PlayerSettings,
    queue: Vec<Track>,
    index: Option<usize>,
    sink: Option<O::Sink>,
    duration_ms: Option<u64>,
    playing: bool,
    play_when_ready: bool,
    /// Index whose last load failed. Playing it again is refused.
    failed: Option<usize>,
}

impl<O: Output> QueueEngine<O> {
    pub fn new(output: O, listener: EngineListener, settings: PlayerSettings) -> Self {
        Self {
            output,
            listener,
            settings,
            queue: Vec::new(),
            index: None,
            sink: None,
            duration_ms: None,
            playing: false,
            play_when_ready: false,
            failed: None,
        }
    }

    /// Make `index` the current item, starting it if `play_when_ready`.
    fn load(&mut self, index: usize) {
        let Some(track) = self.queue.get(index) else {
            return;
        };
        if let Some(old) = self.sink.take() {
            old.discard();
        }
        self.index = Some(index);
        self.listener.emit(EngineEvent::BufferingStarted);

        match self.output.open(track) {
            Ok(opened) => {
                debug!(index, path = %track.path.display(), "item loaded");
                self.failed = None;
                self.duration_ms = opened
                    .duration_ms
                    .or((track.duration_ms > 0).then_some(track.duration_ms));
                if self.play_when_ready {
                    opened.sink.start();
                }
                self.sink = Some(opened.sink);
                self.listener.emit(EngineEvent::Ready);
                self.set_playing(self.play_when_ready);
            }
            Err(e) => {
                warn!(index, error = %e, "cannot play item");
                self.failed = Some(index);
                self.duration_ms = None;
                self.listener.emit(EngineEvent::Error {
                    index,
                    reason: e.to_string(),
                });
                self.report_stopped();
                self.listener.emit(EngineEvent::Idle);
            }
        }
        self.listener.emit(EngineEvent::TracksChanged);
    }

    fn set_playing(&mut self, playing: bool) {
        if self.playing != playing {
            self.playing = playing;
            self.listener.emit(EngineEvent::PlayingChanged(playing));
        }
    }

    /// Report not-playing even when nothing changed here, so an optimistic
    /// "playing" shown upstream gets corrected.
    fn report_stopped(&mut self) {
        self.playing = false;
        self.listener.emit(EngineEvent::PlayingChanged(false));
    }

    fn seek_relative(&mut self, delta_ms: i64) {
        let target = relative_target(self.current_position(), delta_ms, self.duration_ms);
        self.seek(target);
    }

    fn finished(&self) -> bool {
        self.sink.as_ref().is_some_and(ItemSink::is_drained)
    }
}

impl<O: Output> MediaEngine for QueueEngine<O> {
    fn prepare(&mut self, tracks: &[Track]) {
        if let Some(old) = self.sink.take() {
            old.discard();
        }
        self.queue = tracks.to_vec();
        self.failed = None;
        self.play_when_ready = false;
        self.set_playing(false);

        if self.queue.is_empty() {
            self.index = None;
            self.duration_ms = None;
            self.listener.emit(EngineEvent::Idle);
            self.listener.emit(EngineEvent::TracksChanged);
        } else {
            self.load(0);
        }
    }

    fn play(&mut self) {
        self.play_when_ready = true;
        let Some(index) = self.index else {
            return;
        };
        if self.failed == Some(index) {
            debug!(index, "item failed to load; not retrying");
            self.report_stopped();
            return;
        }
        match &self.sink {
            Some(sink) if !sink.is_drained() => {
                sink.start();
                self.set_playing(true);
            }
            // Stopped or played to the end: start the item over.
            _ => self.load(index),
        }
    }

    fn pause(&mut self) {
        self.play_when_ready = false;
        if let Some(sink) = &self.sink {
            sink.hold();
        }
        self.set_playing(false);
    }

    fn stop(&mut self) {
        self.play_when_ready = false;
        if let Some(sink) = self.sink.take() {
            sink.discard();
        }
        self.set_playing(false);
        self.listener.emit(EngineEvent::Idle);
    }

    fn seek(&mut self, position_ms: u64) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.seek_to(position_ms) {
            warn!(position_ms, error = %e, "seek failed");
        }
    }

    fn seek_back(&mut self) {
        let step = i64::try_from(self.settings.seek_back_ms).unwrap_or(i64::MAX);
        self.seek_relative(-step);
    }

    fn seek_forward(&mut self) {
        let step = i64::try_from(self.settings.seek_forward_ms).unwrap_or(i64::MAX);
        self.seek_relative(step);
    }

    fn seek_to_index(&mut self, index: usize) {
        self.load(index);
    }

    fn seek_to_previous(&mut self) {
        let Some(index) = self.index else {
            return;
        };
        match previous_target(
            index,
            self.current_position(),
            self.settings.previous_restart_threshold_ms,
        ) {
            PreviousTarget::Restart => self.seek(0),
            PreviousTarget::Item(prev) => self.load(prev),
        }
    }

    fn seek_to_next(&mut self) {
        if let Some(next) = self.index.and_then(|i| next_index(i, self.queue.len())) {
            self.load(next);
        }
    }

    fn set_play_when_ready(&mut self, play: bool) {
        if play {
            self.play();
        } else {
            self.pause();
        }
    }

    fn current_position(&self) -> u64 {
        self.sink.as_ref().map_or(0, ItemSink::position_ms)
    }

    fn current_index(&self) -> Option<usize> {
        self.index
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn duration(&self) -> Option<u64> {
        self.duration_ms
    }

    fn service(&mut self) {
        if !self.playing || !self.finished() {
            return;
        }
        match self.index.and_then(|i| next_index(i, self.queue.len())) {
            Some(next) => {
                debug!(next, "advancing to next item");
                self.load(next);
            }
            None => {
                info!("end of playlist");
                self.set_playing(false);
                self.listener.emit(EngineEvent::Ended);
            }
        }
    }
}
