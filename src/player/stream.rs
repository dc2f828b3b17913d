use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryIter, unbounded};
use tracing::trace;

use super::types::PlaybackState;

/// Producing end of the state stream. Owned by the controller thread only.
///
/// New subscribers first receive the most recent state, then every state
/// emitted after they subscribed, in emission order.
pub(super) struct StateStream {
    subscribers: Vec<Sender<PlaybackState>>,
    latest: PlaybackState,
}

impl StateStream {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            latest: PlaybackState::Initial,
        }
    }

    pub fn subscribe(&mut self) -> StateReceiver {
        let (tx, rx) = unbounded();
        // Unbounded and freshly created: this send cannot fail.
        let _ = tx.send(self.latest.clone());
        self.subscribers.push(tx);
        StateReceiver { rx }
    }

    pub fn emit(&mut self, state: PlaybackState) {
        trace!(?state, "emit");
        self.subscribers.retain(|tx| tx.send(state.clone()).is_ok());
        self.latest = state;
    }

    #[cfg(test)]
    pub fn latest(&self) -> &PlaybackState {
        &self.latest
    }
}

/// Consuming end of the state stream.
pub struct StateReceiver {
    rx: Receiver<PlaybackState>,
}

impl StateReceiver {
    pub fn try_iter(&self) -> TryIter<'_, PlaybackState> {
        self.rx.try_iter()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<PlaybackState, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}
