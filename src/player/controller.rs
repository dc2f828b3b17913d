use tracing::{debug, info, warn};

use crate::library::Track;

use super::engine::MediaEngine;
use super::error::PlayerError;
use super::playlist::Playlist;
use super::poller::ProgressPoller;
use super::session::SessionHost;
use super::stream::{StateReceiver, StateStream};
use super::types::{EngineEvent, PlaybackState, PlayerEvent};

/// Translates user commands into engine calls and engine callbacks into
/// `PlaybackState` facts.
///
/// Lives on the controller thread; nothing here is shared.
pub(super) struct Controller {
    engine: Box<dyn MediaEngine>,
    session: Box<dyn SessionHost>,
    playlist: Playlist,
    /// Duration from the last `Ready`; fraction seeks are computed against it.
    duration_ms: u64,
    stream: StateStream,
    poller: ProgressPoller,
}

impl Controller {
    pub fn new(
        engine: Box<dyn MediaEngine>,
        session: Box<dyn SessionHost>,
        poller: ProgressPoller,
    ) -> Self {
        Self {
            engine,
            session,
            playlist: Playlist::default(),
            duration_ms: 0,
            stream: StateStream::new(),
            poller,
        }
    }

    pub fn subscribe(&mut self) -> StateReceiver {
        self.stream.subscribe()
    }

    pub fn load_playlist(&mut self, tracks: Vec<Track>) {
        info!(count = tracks.len(), "loading playlist");
        self.playlist = Playlist::new(tracks);
        self.duration_ms = 0;
        self.engine.prepare(self.playlist.tracks());
    }

    pub fn handle_event(&mut self, event: PlayerEvent) -> Result<(), PlayerError> {
        debug!(?event, "player event");
        match event {
            PlayerEvent::PlayPause => self.toggle(),
            PlayerEvent::Stop => {
                self.engine.stop();
                self.stop_progress();
            }
            PlayerEvent::SelectTrack(index) => {
                let index = self.playlist.validate(index)?;
                if self.engine.current_index() == Some(index) {
                    self.toggle();
                } else {
                    self.engine.seek_to_index(index);
                    self.emit(PlaybackState::Playing { is_playing: true });
                    self.engine.set_play_when_ready(true);
                    self.poller.start();
                }
            }
            PlayerEvent::SeekToPrevious => self.engine.seek_to_previous(),
            PlayerEvent::SeekToNext => self.engine.seek_to_next(),
            PlayerEvent::SeekBackwardRelative => self.engine.seek_back(),
            PlayerEvent::SeekForwardRelative => self.engine.seek_forward(),
            PlayerEvent::SeekToFraction(fraction) | PlayerEvent::ScrubProgress(fraction) => {
                self.seek_to_fraction(fraction)?;
            }
        }
        Ok(())
    }

    pub fn on_engine_event(&mut self, event: EngineEvent) {
        debug!(?event, "engine callback");
        match event {
            EngineEvent::BufferingStarted => {
                self.session.ensure_started();
                let position_ms = self.engine.current_position();
                self.emit(PlaybackState::Buffering { position_ms });
            }
            EngineEvent::Ready => {
                self.duration_ms = self.engine.duration().unwrap_or_else(|| {
                    self.engine
                        .current_index()
                        .and_then(|i| self.playlist.get(i))
                        .map_or(0, |t| t.duration_ms)
                });
                self.emit(PlaybackState::Ready {
                    duration_ms: self.duration_ms,
                });
            }
            // Auto-advance and end of queue are the engine's business.
            EngineEvent::Ended | EngineEvent::Idle => {}
            EngineEvent::PlayingChanged(is_playing) => {
                self.emit(PlaybackState::Playing { is_playing });
                self.emit_current_track();
                if is_playing {
                    self.poller.start();
                } else {
                    self.poller.stop();
                }
            }
            EngineEvent::TracksChanged => self.emit_current_track(),
            EngineEvent::Error { index, reason } => {
                warn!(index, %reason, "engine failed to play item");
                self.emit(PlaybackState::Failed { index, reason });
                // Nothing will play: undo an optimistic `Playing{true}`.
                if !self.engine.is_playing() {
                    self.stop_progress();
                }
            }
        }
    }

    /// A poller tick. Ticks from a cancelled ticker are dropped.
    pub fn on_tick(&mut self, generation: u64) {
        if !self.poller.is_current(generation) {
            return;
        }
        let position_ms = self.engine.current_position();
        self.emit(PlaybackState::Progress { position_ms });
    }

    pub fn service_engine(&mut self) {
        self.engine.service();
    }

    /// Cancel sampling without emitting anything.
    pub fn shutdown(&mut self) {
        self.poller.stop();
        info!("player controller stopped");
    }

    fn toggle(&mut self) {
        if self.engine.is_playing() {
            self.engine.pause();
            self.stop_progress();
        } else {
            self.engine.play();
            self.emit(PlaybackState::Playing { is_playing: true });
            self.poller.start();
        }
    }

    fn stop_progress(&mut self) {
        self.poller.stop();
        self.emit(PlaybackState::Playing { is_playing: false });
    }

    fn seek_to_fraction(&mut self, fraction: f32) -> Result<(), PlayerError> {
        if !fraction.is_finite() {
            return Err(PlayerError::InvalidFraction(fraction));
        }
        if self.duration_ms == 0 {
            debug!(fraction, "no known duration; ignoring seek");
            return Ok(());
        }
        let fraction = fraction.clamp(0.0, 1.0) as f64;
        let target = (self.duration_ms as f64 * fraction).round() as u64;
        self.engine.seek(target);
        Ok(())
    }

    fn emit_current_track(&mut self) {
        if let Some(index) = self.engine.current_index() {
            if self.playlist.current() != Some(index) {
                if let Some(track) = self.playlist.get(index) {
                    info!(index, track = %track.display_name, "now playing");
                }
            }
            self.playlist.sync_current(index);
            self.emit(PlaybackState::CurrentTrack { index });
        }
    }

    fn emit(&mut self, state: PlaybackState) {
        self.stream.emit(state);
    }

    #[cfg(test)]
    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<usize> {
        self.playlist.current()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crossbeam_channel::{Receiver, unbounded};

    use super::*;
    use crate::player::testing::{EngineCall, FakeEngine, FakeSession, FakeState, tracks};
    use crate::player::thread::Inbox;

    struct Harness {
        controller: Controller,
        engine: Arc<Mutex<FakeState>>,
        states: StateReceiver,
        inbox: Receiver<Inbox>,
        session_starts: Arc<AtomicUsize>,
    }

    impl Harness {
        fn new(n: usize) -> Self {
            let (tx, inbox) = unbounded();
            let (engine, state) = FakeEngine::new();
            let session = FakeSession::default();
            let session_starts = session.starts.clone();
            let mut controller = Controller::new(
                Box::new(engine),
                Box::new(session),
                ProgressPoller::new(Duration::from_millis(10), tx),
            );
            let states = controller.subscribe();
            controller.load_playlist(tracks(n));
            let h = Self {
                controller,
                engine: state,
                states,
                inbox,
                session_starts,
            };
            h.drain();
            h.engine().calls.clear();
            h
        }

        fn engine(&self) -> std::sync::MutexGuard<'_, FakeState> {
            self.engine.lock().unwrap()
        }

        fn drain(&self) -> Vec<PlaybackState> {
            self.states.try_iter().collect()
        }

        fn next_tick(&self) -> u64 {
            loop {
                match self.inbox.recv_timeout(Duration::from_secs(2)).unwrap() {
                    Inbox::Tick(g) => return g,
                    _ => continue,
                }
            }
        }
    }

    #[test]
    fn load_playlist_prepares_engine_and_emits_nothing() {
        let (tx, _inbox) = unbounded();
        let (engine, state) = FakeEngine::new();
        let mut c = Controller::new(
            Box::new(engine),
            Box::new(FakeSession::default()),
            ProgressPoller::new(Duration::from_millis(10), tx),
        );
        let states = c.subscribe();
        c.load_playlist(tracks(3));

        assert_eq!(state.lock().unwrap().calls, vec![EngineCall::Prepare(3)]);
        let seen: Vec<_> = states.try_iter().collect();
        assert_eq!(seen, vec![PlaybackState::Initial]);
    }

    #[test]
    fn selecting_another_track_is_optimistic_and_waits_for_engine_index() {
        let mut h = Harness::new(3);

        h.controller
            .handle_event(PlayerEvent::SelectTrack(2))
            .unwrap();

        assert_eq!(
            h.engine().calls,
            vec![EngineCall::SeekToIndex(2), EngineCall::PlayWhenReady(true)]
        );
        assert_eq!(h.drain(), vec![PlaybackState::Playing { is_playing: true }]);
        assert!(h.controller.is_polling());

        h.controller.on_engine_event(EngineEvent::TracksChanged);
        assert_eq!(h.drain(), vec![PlaybackState::CurrentTrack { index: 2 }]);
        assert_eq!(h.controller.current(), Some(2));
    }

    #[test]
    fn selecting_the_current_track_while_playing_pauses() {
        let mut h = Harness::new(3);
        h.engine().playing = true;
        h.engine().index = Some(1);

        h.controller
            .handle_event(PlayerEvent::SelectTrack(1))
            .unwrap();

        assert_eq!(h.engine().calls, vec![EngineCall::Pause]);
        let seen = h.drain();
        assert_eq!(seen.first(), Some(&PlaybackState::Playing { is_playing: false }));
        assert!(!seen.contains(&PlaybackState::Playing { is_playing: true }));
        assert!(!h.controller.is_polling());
    }

    #[test]
    fn out_of_range_selection_is_rejected_before_the_engine() {
        let mut h = Harness::new(3);

        let err = h
            .controller
            .handle_event(PlayerEvent::SelectTrack(3))
            .unwrap_err();

        assert_eq!(err.kind(), crate::player::ErrorKind::InvalidArgument);
        assert!(h.engine().calls.is_empty());
        assert!(h.drain().is_empty());
    }

    #[test]
    fn play_pause_round_trip_ends_paused_without_poller() {
        let mut h = Harness::new(2);

        h.controller.handle_event(PlayerEvent::PlayPause).unwrap();
        assert!(h.controller.is_polling());
        h.controller.handle_event(PlayerEvent::PlayPause).unwrap();

        assert_eq!(h.engine().calls, vec![EngineCall::Play, EngineCall::Pause]);
        assert_eq!(
            h.drain(),
            vec![
                PlaybackState::Playing { is_playing: true },
                PlaybackState::Playing { is_playing: false },
            ]
        );
        assert!(!h.controller.is_polling());
    }

    #[test]
    fn current_ticks_sample_the_engine_position() {
        let mut h = Harness::new(1);
        h.controller.handle_event(PlayerEvent::PlayPause).unwrap();
        h.drain();
        h.engine().position_ms = 42_000;

        let g = h.next_tick();
        h.controller.on_tick(g);

        assert_eq!(
            h.drain(),
            vec![PlaybackState::Progress {
                position_ms: 42_000
            }]
        );
    }

    #[test]
    fn stop_emits_not_playing_and_later_ticks_are_dropped() {
        let mut h = Harness::new(1);
        h.controller.handle_event(PlayerEvent::PlayPause).unwrap();
        let g = h.next_tick();

        h.controller.handle_event(PlayerEvent::Stop).unwrap();
        assert_eq!(h.engine().calls.last(), Some(&EngineCall::Stop));
        assert_eq!(
            h.drain().last(),
            Some(&PlaybackState::Playing { is_playing: false })
        );

        h.controller.on_tick(g);
        for msg in h.inbox.try_iter().collect::<Vec<_>>() {
            if let Inbox::Tick(g) = msg {
                h.controller.on_tick(g);
            }
        }
        assert!(h.drain().is_empty());
        assert!(!h.controller.is_polling());
    }

    #[test]
    fn fraction_seeks_use_the_last_ready_duration() {
        let mut h = Harness::new(1);
        h.engine().duration_ms = Some(200_000);
        h.controller.on_engine_event(EngineEvent::Ready);
        assert_eq!(
            h.drain(),
            vec![PlaybackState::Ready {
                duration_ms: 200_000
            }]
        );

        h.controller
            .handle_event(PlayerEvent::SeekToFraction(0.25))
            .unwrap();
        h.controller
            .handle_event(PlayerEvent::ScrubProgress(1.5))
            .unwrap();
        h.controller
            .handle_event(PlayerEvent::ScrubProgress(-0.5))
            .unwrap();

        assert_eq!(
            h.engine().calls,
            vec![
                EngineCall::Seek(50_000),
                EngineCall::Seek(200_000),
                EngineCall::Seek(0)
            ]
        );
    }

    #[test]
    fn non_finite_fractions_are_rejected() {
        let mut h = Harness::new(1);
        h.controller.on_engine_event(EngineEvent::Ready);

        for f in [f32::NAN, f32::INFINITY] {
            let err = h
                .controller
                .handle_event(PlayerEvent::SeekToFraction(f))
                .unwrap_err();
            assert_eq!(err.kind(), crate::player::ErrorKind::InvalidArgument);
        }
        assert!(h.engine().calls.is_empty());
    }

    #[test]
    fn fraction_seek_without_duration_is_a_no_op() {
        let mut h = Harness::new(1);

        h.controller
            .handle_event(PlayerEvent::SeekToFraction(0.5))
            .unwrap();

        assert!(h.engine().calls.is_empty());
    }

    #[test]
    fn ready_falls_back_to_catalog_duration() {
        let mut h = Harness::new(2);
        h.engine().duration_ms = None;

        h.controller.on_engine_event(EngineEvent::Ready);

        assert_eq!(
            h.drain(),
            vec![PlaybackState::Ready {
                duration_ms: 180_000
            }]
        );
    }

    #[test]
    fn buffering_starts_session_and_reports_position() {
        let mut h = Harness::new(1);
        h.engine().position_ms = 1_234;

        h.controller.on_engine_event(EngineEvent::BufferingStarted);

        assert_eq!(h.session_starts.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.drain(),
            vec![PlaybackState::Buffering { position_ms: 1_234 }]
        );
    }

    #[test]
    fn playing_changed_reports_transport_then_index() {
        let mut h = Harness::new(3);
        h.engine().index = Some(1);

        h.controller
            .on_engine_event(EngineEvent::PlayingChanged(true));
        assert_eq!(
            h.drain(),
            vec![
                PlaybackState::Playing { is_playing: true },
                PlaybackState::CurrentTrack { index: 1 },
            ]
        );
        assert!(h.controller.is_polling());

        h.controller
            .on_engine_event(EngineEvent::PlayingChanged(false));
        assert_eq!(
            h.drain().first(),
            Some(&PlaybackState::Playing { is_playing: false })
        );
        assert!(!h.controller.is_polling());
    }

    #[test]
    fn unknown_engine_index_is_not_reported() {
        let mut h = Harness::new(0);

        h.controller.on_engine_event(EngineEvent::TracksChanged);

        assert!(h.drain().is_empty());
    }

    #[test]
    fn ended_and_idle_emit_nothing() {
        let mut h = Harness::new(1);

        h.controller.on_engine_event(EngineEvent::Ended);
        h.controller.on_engine_event(EngineEvent::Idle);

        assert!(h.drain().is_empty());
        assert!(h.engine().calls.is_empty());
    }

    #[test]
    fn engine_errors_surface_as_failed() {
        let mut h = Harness::new(2);

        h.controller.on_engine_event(EngineEvent::Error {
            index: 1,
            reason: "unsupported format".into(),
        });

        assert_eq!(
            h.drain(),
            vec![
                PlaybackState::Failed {
                    index: 1,
                    reason: "unsupported format".into()
                },
                PlaybackState::Playing { is_playing: false },
            ]
        );
    }

    #[test]
    fn unplayable_selection_settles_not_playing_without_retry() {
        let mut h = Harness::new(3);
        h.engine().broken.push(2);

        h.controller
            .handle_event(PlayerEvent::SelectTrack(2))
            .unwrap();
        // The optimistic update goes out before the engine reports back.
        assert!(h.controller.is_polling());
        assert_eq!(
            h.engine().calls,
            vec![EngineCall::SeekToIndex(2), EngineCall::PlayWhenReady(true)]
        );

        h.controller.on_engine_event(EngineEvent::Error {
            index: 2,
            reason: "cannot decode".into(),
        });
        h.controller
            .on_engine_event(EngineEvent::PlayingChanged(false));

        let seen = h.drain();
        let failures = seen
            .iter()
            .filter(|s| matches!(s, PlaybackState::Failed { .. }))
            .count();
        assert_eq!(failures, 1, "{seen:?}");
        let last_playing = seen
            .iter()
            .rev()
            .find(|s| matches!(s, PlaybackState::Playing { .. }));
        assert_eq!(
            last_playing,
            Some(&PlaybackState::Playing { is_playing: false })
        );
        assert!(!h.controller.is_polling());
        assert_eq!(h.engine().calls.len(), 2);
    }

    #[test]
    fn navigation_commands_go_straight_to_the_engine() {
        let mut h = Harness::new(3);

        for event in [
            PlayerEvent::SeekToNext,
            PlayerEvent::SeekToPrevious,
            PlayerEvent::SeekForwardRelative,
            PlayerEvent::SeekBackwardRelative,
        ] {
            h.controller.handle_event(event).unwrap();
        }

        assert_eq!(
            h.engine().calls,
            vec![
                EngineCall::SeekToNext,
                EngineCall::SeekToPrevious,
                EngineCall::SeekForward,
                EngineCall::SeekBack,
            ]
        );
        assert!(h.drain().is_empty());
    }
}
