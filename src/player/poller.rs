use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Sender, bounded, select};
use tracing::{debug, warn};

use super::thread::Inbox;

struct Ticker {
    generation: u64,
    cancel: Sender<()>,
    join: JoinHandle<()>,
}

/// Periodic position sampler.
///
/// At most one ticker thread runs at a time. Each start bumps a generation
/// number carried by every tick, so ticks queued by a cancelled ticker can
/// be recognised and dropped by the controller.
pub(super) struct ProgressPoller {
    interval: Duration,
    inbox: Sender<Inbox>,
    generation: u64,
    active: Option<Ticker>,
}

impl ProgressPoller {
    pub fn new(interval: Duration, inbox: Sender<Inbox>) -> Self {
        Self {
            interval,
            inbox,
            generation: 0,
            active: None,
        }
    }

    /// Start sampling, replacing any running ticker.
    pub fn start(&mut self) {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let interval = self.interval;
        let inbox = self.inbox.clone();
        let (cancel, cancelled) = bounded::<()>(0);

        let spawned = thread::Builder::new()
            .name("progress-poller".into())
            .spawn(move || {
                loop {
                    select! {
                        recv(cancelled) -> _ => break,
                        default(interval) => {
                            if inbox.send(Inbox::Tick(generation)).is_err() {
                                break;
                            }
                        }
                    }
                }
            });

        match spawned {
            Ok(join) => {
                debug!(generation, "progress poller started");
                self.active = Some(Ticker {
                    generation,
                    cancel,
                    join,
                });
            }
            Err(e) => warn!(error = %e, "failed to spawn progress poller"),
        }
    }

    /// Stop sampling. Returns whether a ticker was running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.cancel();
        // Invalidate ticks already sitting in the inbox.
        self.generation += 1;
        was_running
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|t| t.generation == generation)
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    fn cancel(&mut self) -> bool {
        let Some(ticker) = self.active.take() else {
            return false;
        };
        drop(ticker.cancel);
        if ticker.join.join().is_err() {
            warn!("progress poller panicked");
        }
        debug!(generation = ticker.generation, "progress poller stopped");
        true
    }
}

impl Drop for ProgressPoller {
    fn drop(&mut self) {
        self.cancel();
    }
}
