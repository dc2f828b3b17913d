use std::sync::Mutex;
use std::thread::JoinHandle;

use crossbeam_channel::{Sender, bounded, unbounded};
use tracing::warn;

use crate::config::PlayerSettings;
use crate::library::Track;

use super::engine::{EngineListener, MediaEngine};
use super::error::PlayerError;
use super::session::SessionHost;
use super::stream::StateReceiver;
use super::thread::{EngineFactory, Inbox, spawn_player_thread};
use super::types::PlayerEvent;

/// Front door to the controller thread.
pub struct PlayerHandle {
    tx: Sender<Inbox>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerHandle {
    /// Start the controller thread and build the engine on it.
    ///
    /// `make_engine` runs on the controller thread, so the engine itself
    /// does not need to be `Send`.
    pub fn spawn<E, F>(
        settings: &PlayerSettings,
        session: impl SessionHost + 'static,
        make_engine: F,
    ) -> Result<Self, PlayerError>
    where
        E: MediaEngine + 'static,
        F: FnOnce(EngineListener) -> Result<E, PlayerError> + Send + 'static,
    {
        let (tx, rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);

        let factory: EngineFactory = Box::new(move |listener| {
            make_engine(listener).map(|e| Box::new(e) as Box<dyn MediaEngine>)
        });
        let join = spawn_player_thread(
            settings,
            factory,
            Box::new(session),
            tx.clone(),
            rx,
            ready_tx,
        )?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                tx,
                join: Mutex::new(Some(join)),
            }),
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e)
            }
            Err(_) => {
                let _ = join.join();
                Err(PlayerError::Disconnected)
            }
        }
    }

    /// Hand a new playlist to the engine. Does not start playback.
    pub fn load_playlist(&self, tracks: Vec<Track>) -> Result<(), PlayerError> {
        self.send(Inbox::Load(tracks))
    }

    /// Submit a command and wait until the controller has processed it.
    ///
    /// States emitted while handling the command are already on every
    /// subscriber's channel when this returns.
    pub fn submit(&self, event: PlayerEvent) -> Result<(), PlayerError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.send(Inbox::Submit(event, reply_tx))?;
        reply_rx.recv().map_err(|_| PlayerError::Disconnected)?
    }

    /// Subscribe to the state stream. The first state received is the
    /// latest one emitted (`Initial` before anything happened).
    pub fn subscribe(&self) -> Result<StateReceiver, PlayerError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.send(Inbox::Subscribe(reply_tx))?;
        reply_rx.recv().map_err(|_| PlayerError::Disconnected)
    }

    /// Stop the controller thread and wait for it. Idempotent.
    pub fn shutdown(&self) {
        let join = match self.join.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(join) = join else {
            return;
        };
        let _ = self.tx.send(Inbox::Shutdown);
        if join.join().is_err() {
            warn!("player thread panicked");
        }
    }

    fn send(&self, msg: Inbox) -> Result<(), PlayerError> {
        self.tx.send(msg).map_err(|_| PlayerError::Disconnected)
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
