use crossbeam_channel::Sender;
use tracing::debug;

use crate::library::Track;

use super::thread::Inbox;
use super::types::EngineEvent;

/// The contract a media engine fulfils for the controller.
///
/// All methods are called from the controller thread. Lifecycle changes are
/// reported back through the `EngineListener` the engine was built with,
/// never by calling into the controller directly.
pub trait MediaEngine {
    /// Replace the queue with `tracks` and prepare the first item.
    fn prepare(&mut self, tracks: &[Track]);
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    /// Absolute seek within the current item.
    fn seek(&mut self, position_ms: u64);
    fn seek_back(&mut self);
    fn seek_forward(&mut self);
    fn seek_to_index(&mut self, index: usize);
    /// Restart the current item or move to the previous one.
    fn seek_to_previous(&mut self);
    fn seek_to_next(&mut self);
    fn set_play_when_ready(&mut self, play: bool);

    fn current_position(&self) -> u64;
    fn current_index(&self) -> Option<usize>;
    fn is_playing(&self) -> bool;
    /// Duration of the current item, when the engine knows it.
    fn duration(&self) -> Option<u64>;

    /// Called periodically on the controller thread while it is idle.
    fn service(&mut self) {}
}

/// Delivers engine callbacks to the controller inbox.
#[derive(Clone)]
pub struct EngineListener {
    inbox: Sender<Inbox>,
}

impl EngineListener {
    pub(super) fn new(inbox: Sender<Inbox>) -> Self {
        Self { inbox }
    }

    pub fn emit(&self, event: EngineEvent) {
        if self.inbox.send(Inbox::Engine(event)).is_err() {
            debug!("controller stopped; dropping engine callback");
        }
    }
}
