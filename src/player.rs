//! Playback control and state synchronization.
//!
//! A single controller thread owns the media engine, the playlist and the
//! producing end of the state stream. User commands, engine callbacks and
//! progress ticks all arrive through one inbox, so every `PlaybackState`
//! is emitted from one place and in arrival order.

mod controller;
mod engine;
mod error;
mod handle;
mod playlist;
mod poller;
mod progress;
mod session;
mod stream;
mod thread;
mod types;

pub use engine::{EngineListener, MediaEngine};
pub use error::{ErrorKind, PlayerError};
pub use handle::PlayerHandle;
pub use progress::{format_timestamp, percentage};
pub use session::SessionHost;
pub use stream::StateReceiver;
pub use types::{EngineEvent, PlaybackState, PlayerEvent};

#[cfg(test)]
pub(crate) mod testing;
