use std::io;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, warn};

use crate::config::PlayerSettings;
use crate::library::Track;

use super::controller::Controller;
use super::engine::{EngineListener, MediaEngine};
use super::error::PlayerError;
use super::poller::ProgressPoller;
use super::session::SessionHost;
use super::stream::StateReceiver;
use super::types::{EngineEvent, PlayerEvent};

/// How often the engine gets a chance to notice end-of-track and similar
/// conditions it cannot report on its own.
const ENGINE_SERVICE_INTERVAL: Duration = Duration::from_millis(200);

pub(super) type EngineFactory =
    Box<dyn FnOnce(EngineListener) -> Result<Box<dyn MediaEngine>, PlayerError> + Send>;

/// Everything the controller thread reacts to, in arrival order.
pub(crate) enum Inbox {
    Load(Vec<Track>),
    Submit(PlayerEvent, Sender<Result<(), PlayerError>>),
    Subscribe(Sender<StateReceiver>),
    Engine(EngineEvent),
    Tick(u64),
    Shutdown,
}

/// Spawn the controller thread. The engine is built on that thread, and
/// `ready` receives the outcome before any message is processed.
pub(super) fn spawn_player_thread(
    settings: &PlayerSettings,
    make_engine: EngineFactory,
    session: Box<dyn SessionHost>,
    inbox_tx: Sender<Inbox>,
    inbox_rx: Receiver<Inbox>,
    ready: Sender<Result<(), PlayerError>>,
) -> io::Result<JoinHandle<()>> {
    let interval = settings.progress_interval();

    thread::Builder::new().name("player".into()).spawn(move || {
        let engine = match make_engine(EngineListener::new(inbox_tx.clone())) {
            Ok(engine) => engine,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
        let poller = ProgressPoller::new(interval, inbox_tx);
        let mut controller = Controller::new(engine, session, poller);
        let _ = ready.send(Ok(()));

        run(&mut controller, &inbox_rx);
        controller.shutdown();
    })
}

fn run(controller: &mut Controller, inbox: &Receiver<Inbox>) {
    let mut last_service = Instant::now();

    loop {
        match inbox.recv_timeout(ENGINE_SERVICE_INTERVAL) {
            Ok(Inbox::Shutdown) => {
                debug!("player shutdown requested");
                return;
            }
            Ok(msg) => dispatch(controller, msg),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return,
        }

        if last_service.elapsed() >= ENGINE_SERVICE_INTERVAL {
            controller.service_engine();
            last_service = Instant::now();
        }
    }
}

fn dispatch(controller: &mut Controller, msg: Inbox) {
    match msg {
        Inbox::Load(tracks) => controller.load_playlist(tracks),
        Inbox::Submit(event, reply) => {
            let result = controller.handle_event(event);
            if let Err(e) = &result {
                warn!(?event, error = %e, "rejected player event");
            }
            let _ = reply.send(result);
        }
        Inbox::Subscribe(reply) => {
            let _ = reply.send(controller.subscribe());
        }
        Inbox::Engine(event) => controller.on_engine_event(event),
        Inbox::Tick(generation) => controller.on_tick(generation),
        Inbox::Shutdown => {}
    }
}
