/// A media session that advertises playback to the rest of the system.
///
/// The controller calls `ensure_started` when the engine starts buffering.
/// Implementations must treat repeated calls as a no-op once running.
pub trait SessionHost: Send {
    fn ensure_started(&mut self);
}
