use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, warn};

use crate::app::App;
use crate::config;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::player::{ErrorKind, PlayerEvent, PlayerHandle, StateReceiver};
use crate::runtime::mpris_sync::MprisSync;
use crate::ui;

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Intent {
    Quit,
    Down,
    Up,
    Top,
    Bottom,
    /// Play the track under the cursor.
    PlaySelected,
    /// Move the progress bar by this fraction of the track.
    Scrub(f32),
    Player(PlayerEvent),
}

/// Map a key to an intent. `pending_g` carries the first half of `gg`.
fn intent_for_key(code: KeyCode, pending_g: &mut bool, scrub_step: f32) -> Option<Intent> {
    if code == KeyCode::Char('g') {
        if *pending_g {
            *pending_g = false;
            return Some(Intent::Top);
        }
        *pending_g = true;
        return None;
    }
    *pending_g = false;

    let intent = match code {
        KeyCode::Char('q') => Intent::Quit,
        KeyCode::Char('j') | KeyCode::Down => Intent::Down,
        KeyCode::Char('k') | KeyCode::Up => Intent::Up,
        KeyCode::Char('G') => Intent::Bottom,
        KeyCode::Enter => Intent::PlaySelected,
        KeyCode::Char(' ') | KeyCode::Char('p') => Intent::Player(PlayerEvent::PlayPause),
        KeyCode::Char('s') => Intent::Player(PlayerEvent::Stop),
        KeyCode::Char('h') => Intent::Player(PlayerEvent::SeekToPrevious),
        KeyCode::Char('l') => Intent::Player(PlayerEvent::SeekToNext),
        KeyCode::Char('H') => Intent::Player(PlayerEvent::SeekBackwardRelative),
        KeyCode::Char('L') => Intent::Player(PlayerEvent::SeekForwardRelative),
        KeyCode::Char(',') => Intent::Scrub(-scrub_step),
        KeyCode::Char('.') => Intent::Scrub(scrub_step),
        KeyCode::Char(c @ '0'..='9') => {
            let tenth = c.to_digit(10).unwrap_or(0) as f32 / 10.0;
            Intent::Player(PlayerEvent::SeekToFraction(tenth))
        }
        _ => return None,
    };
    Some(intent)
}

/// Translate a remote MPRIS command. `Quit` is handled by the caller.
fn event_for_control(cmd: &ControlCmd, is_playing: bool) -> Option<PlayerEvent> {
    match cmd {
        ControlCmd::Play if !is_playing => Some(PlayerEvent::PlayPause),
        ControlCmd::Pause if is_playing => Some(PlayerEvent::PlayPause),
        ControlCmd::Play | ControlCmd::Pause | ControlCmd::Quit => None,
        ControlCmd::PlayPause => Some(PlayerEvent::PlayPause),
        ControlCmd::Stop => Some(PlayerEvent::Stop),
        ControlCmd::Next => Some(PlayerEvent::SeekToNext),
        ControlCmd::Prev => Some(PlayerEvent::SeekToPrevious),
    }
}

/// Submit to the player. Rejected arguments are logged; a dead player
/// thread ends the loop.
fn submit(player: &PlayerHandle, event: PlayerEvent) -> Result<(), Box<dyn std::error::Error>> {
    match player.submit(event) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::InvalidArgument => {
            warn!(?event, error = %e, "command rejected");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Main terminal loop: drain player states, mirror them to MPRIS, draw,
/// then handle remote commands and keys. Returns when quit is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    player: &PlayerHandle,
    states: &StateReceiver,
    mpris: &MprisHandle,
    control_rx: &mpsc::Receiver<ControlCmd>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut pending_g = false;
    let mut mpris_sync = MprisSync::default();

    loop {
        for state in states.try_iter() {
            app.apply(&state);
        }
        mpris_sync.update(mpris, app);

        terminal.draw(|f| ui::draw(f, app, &settings.ui, &settings.controls))?;

        while let Ok(cmd) = control_rx.try_recv() {
            debug!(?cmd, "remote command");
            if cmd == ControlCmd::Quit {
                return Ok(());
            }
            if let Some(event) = event_for_control(&cmd, app.now_playing.is_playing) {
                app.follow_playback_on();
                submit(player, event)?;
            }
        }

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(KeyEvent { code, kind, .. }) = event::read()? else {
            continue;
        };
        if kind != KeyEventKind::Press {
            continue;
        }

        match intent_for_key(code, &mut pending_g, settings.controls.scrub_step) {
            None => {}
            Some(Intent::Quit) => return Ok(()),
            Some(Intent::Down) => {
                app.follow_playback_off();
                app.next();
            }
            Some(Intent::Up) => {
                app.follow_playback_off();
                app.prev();
            }
            Some(Intent::Top) => {
                app.follow_playback_off();
                app.first();
            }
            Some(Intent::Bottom) => {
                app.follow_playback_off();
                app.last();
            }
            Some(Intent::PlaySelected) => {
                if app.has_tracks() {
                    app.follow_playback_on();
                    submit(player, PlayerEvent::SelectTrack(app.selected))?;
                }
            }
            Some(Intent::Scrub(delta)) => {
                let fraction = app.scrub(delta);
                submit(player, PlayerEvent::ScrubProgress(fraction))?;
            }
            Some(Intent::Player(event)) => submit(player, event)?,
        }
    }
}
