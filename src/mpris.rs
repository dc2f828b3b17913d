//! MPRIS media session on the D-Bus session bus.
//!
//! The bus service starts lazily the first time the player starts
//! buffering. Remote commands arrive as `ControlCmd`s on a std channel
//! that the event loop drains.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use zbus::object_server::InterfaceRef;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::library::Track;
use crate::player::SessionHost;

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.cadence";
const NOTIFY_POLL: Duration = Duration::from_millis(250);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Default)]
struct SharedState {
    status: PlaybackStatus,
    title: Option<String>,
    artist: Vec<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<ObjectPath<'static>>,
}

/// Publishes player state to the bus service.
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    pub fn set_status(&self, status: PlaybackStatus) {
        if let Ok(mut s) = self.state.lock() {
            s.status = status;
        }
        let _ = self.notify.send(());
    }

    pub fn set_track_metadata(&self, track: Option<&Track>) {
        if let Ok(mut s) = self.state.lock() {
            match track {
                Some(t) => {
                    s.title = Some(t.title.clone());
                    s.artist = t.artist.iter().cloned().collect();
                    s.url = Some(format!("file://{}", t.path.display()));
                    s.length_micros = i64::try_from(t.duration_ms)
                        .ok()
                        .and_then(|ms| ms.checked_mul(1_000))
                        .filter(|us| *us > 0);
                }
                None => {
                    s.title = None;
                    s.artist.clear();
                    s.url = None;
                    s.length_micros = None;
                }
            }
            s.track_id = track
                .and_then(|t| ObjectPath::try_from(format!("{OBJECT_PATH}/track/{}", t.id)).ok());
        }
        let _ = self.notify.send(());
    }
}

/// The session host handed to the player. Starts the bus service once.
pub struct MprisService {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify: Option<Receiver<()>>,
}

impl SessionHost for MprisService {
    fn ensure_started(&mut self) {
        let Some(notify) = self.notify.take() else {
            return;
        };
        let tx = self.tx.clone();
        let state = self.state.clone();
        let spawned = std::thread::Builder::new()
            .name("mpris".into())
            .spawn(move || block_on(serve(tx, state, notify)));
        if let Err(e) = spawned {
            warn!(error = %e, "failed to spawn MPRIS thread");
        }
    }
}

/// Create the session host and the handle used to publish state.
pub fn session(tx: Sender<ControlCmd>) -> (MprisService, MprisHandle) {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel();
    (
        MprisService {
            tx,
            state: state.clone(),
            notify: Some(notify_rx),
        },
        MprisHandle {
            state,
            notify: notify_tx,
        },
    )
}

/// Claim the bus name and export both interfaces.
async fn register(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
) -> zbus::Result<(Connection, InterfaceRef<PlayerIface>)> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let server = connection.object_server();
    server.at(OBJECT_PATH, RootIface { tx: tx.clone() }).await?;
    server.at(OBJECT_PATH, PlayerIface { tx, state }).await?;
    let player = server.interface::<_, PlayerIface>(OBJECT_PATH).await?;
    Ok((connection, player))
}

/// Drain pending notifications. `None` once the publisher is gone.
fn take_dirty(notify: &Receiver<()>) -> Option<bool> {
    let mut dirty = false;
    loop {
        match notify.try_recv() {
            Ok(()) => dirty = true,
            Err(TryRecvError::Empty) => return Some(dirty),
            Err(TryRecvError::Disconnected) => return None,
        }
    }
}

async fn serve(tx: Sender<ControlCmd>, state: Arc<Mutex<SharedState>>, notify: Receiver<()>) {
    // The connection must outlive the loop or the name is released.
    let (_connection, player) = match register(tx, state).await {
        Ok(registered) => registered,
        Err(e) => {
            warn!(error = %e, "MPRIS unavailable");
            return;
        }
    };
    info!(name = BUS_NAME, "MPRIS service started");

    while let Some(dirty) = take_dirty(&notify) {
        if dirty {
            let emitter = player.signal_emitter();
            let iface = player.get().await;
            let status = iface.playback_status_changed(emitter).await;
            let metadata = iface.metadata_changed(emitter).await;
            if let Err(e) = status.and(metadata) {
                debug!(error = %e, "MPRIS: PropertiesChanged failed");
            }
        }
        Timer::after(NOTIFY_POLL).await;
    }
    debug!("MPRIS: publisher gone, stopping");
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {}

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "cadence"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.status {
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let mut put = |key: &str, value: Value| {
            if let Ok(v) = OwnedValue::try_from(value) {
                map.insert(key.to_string(), v);
            }
        };
        if let Some(id) = &s.track_id {
            put("mpris:trackid", Value::from(id.clone()));
        }
        if let Some(title) = &s.title {
            put("xesam:title", Value::from(title.clone()));
        }
        if !s.artist.is_empty() {
            put("xesam:artist", Value::from(s.artist.clone()));
        }
        if let Some(url) = &s.url {
            put("xesam:url", Value::from(url.clone()));
        }
        if let Some(len) = s.length_micros {
            put("mpris:length", Value::from(len));
        }
        drop(s);
        map
    }
}
