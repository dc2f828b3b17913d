use std::env;
use std::path::Path;
use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::engine::RodioEngine;
use crate::library::scan;
use crate::logging;
use crate::mpris::{self, ControlCmd};
use crate::player::{PlayerError, PlayerEvent, PlayerHandle};

mod event_loop;
mod mpris_sync;
mod settings;

/// Submits `Stop` when dropped, so every exit after the player is up
/// leaves it stopped.
struct StopOnExit<'a>(&'a PlayerHandle);

impl Drop for StopOnExit<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.0.submit(PlayerEvent::Stop) {
            warn!(error = %e, "stop on exit failed");
        }
    }
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config_warning) = settings::load_settings();

    let mut args = env::args().skip(1);
    let first = args.next();
    if first.as_deref() == Some("--print-config") {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    if let Err(e) = logging::init(&settings.logging) {
        eprintln!("cadence: logging disabled: {e}");
    }
    if let Some(msg) = config_warning {
        warn!("{msg}");
    }

    let dir = first.unwrap_or_else(|| {
        env::current_dir()
            .ok()
            .and_then(|p| p.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| ".".to_string())
    });

    let tracks = scan(Path::new(&dir), &settings.library);

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let (session, mpris) = mpris::session(control_tx);

    let engine_settings = settings.player.clone();
    let player = PlayerHandle::spawn(&settings.player, session, move |listener| {
        RodioEngine::open(listener, engine_settings).map_err(PlayerError::from)
    })?;
    let stop_on_exit = StopOnExit(&player);
    let states = player.subscribe()?;

    let mut app = App::new(tracks.clone());
    app.follow_playback = settings.ui.follow_playback;
    app.set_current_dir(dir);
    player.load_playlist(tracks)?;
    info!(tracks = app.tracks.len(), "cadence started");

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut app,
        &player,
        &states,
        &mpris,
        &control_rx,
    );

    drop(stop_on_exit);
    player.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}
