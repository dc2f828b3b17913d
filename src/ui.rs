//! UI rendering for the terminal front end.
//!
//! Everything here reads the `App` view model; nothing talks to the player.

use std::{collections::BTreeMap, sync::LazyLock};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    symbols,
    widgets::{Block, Borders, LineGauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::{App, UiState};
use crate::config::{ControlsSettings, UiSettings};

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "down/up");
    map.insert("gg/G", "top/bottom");
    map.insert("enter", "play selected");
    map.insert("space/p", "play/pause");
    map.insert("h/l", "prev/next");
    map.insert("H/L", "seek -/+");
    map.insert("0-9", "jump to n0%");
    map.insert("s", "stop");
    map.insert("q", "quit");
    map
});

/// Footer help text; the scrub step comes from config.
fn controls_text(scrub_step: f32) -> String {
    let order = [
        "j/k", "gg/G", "enter", "space/p", "h/l", "H/L", ",/.", "0-9", "s", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == ",/." {
                Some(format!("[,/.] scrub -/+{:.0}%", scrub_step * 100.0))
            } else {
                CONTROLS_MAP.get(k).map(|v| format!("[{k}] {v}"))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

fn status_text(app: &App) -> String {
    let np = &app.now_playing;
    let mut parts: Vec<String> = Vec::new();

    if app.follow_playback {
        parts.push("CURSOR: Follow".to_string());
    } else {
        parts.push("CURSOR: Free-roam".to_string());
    }

    match app.current_track() {
        Some(track) => {
            let song = match track.artist.as_deref() {
                Some(artist) => format!("{} - {}", artist, track.title),
                None => track.title.clone(),
            };
            parts.push(format!(
                "Song: {song} [{}/{}]",
                np.progress_text,
                np.duration_text()
            ));
            parts.push(if np.is_playing { "Playing" } else { "Paused" }.to_string());
        }
        None if np.ui_state == UiState::Initial => parts.push("Loading".to_string()),
        None => parts.push("Stopped".to_string()),
    }

    if let Some(err) = &np.last_error {
        parts.push(format!("ERROR: {err}"));
    }

    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {dir}"));
    }

    parts.join(" • ")
}

/// The slice of a `total`-long list to show in `height` rows, keeping
/// `selected` centred when possible. Returns `(start, end, selected_row)`.
fn visible_window(total: usize, height: usize, selected: usize) -> (usize, usize, usize) {
    let selected = selected.min(total.saturating_sub(1));
    if total <= height || height == 0 {
        return (0, total, selected);
    }
    let half = height / 2;
    let start = selected.saturating_sub(half).min(total - height);
    (start, start + height, selected - start)
}

/// Render the whole UI into `frame`.
pub fn draw(frame: &mut Frame, app: &App, ui: &UiSettings, controls: &ControlsSettings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" cadence ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status = Paragraph::new(status_text(app))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    let gauge = LineGauge::default()
        .filled_style(Style::default().add_modifier(Modifier::BOLD))
        .line_set(symbols::line::THICK)
        .ratio(app.now_playing.ratio());
    frame.render_widget(gauge, chunks[2]);

    {
        let total = app.tracks.len();
        let (start, end, selected_row) =
            visible_window(total, chunks[3].height.saturating_sub(2) as usize, app.selected);

        let items: Vec<ListItem> = app.tracks[start..end]
            .iter()
            .enumerate()
            .map(|(row, t)| {
                let playing = app.now_playing.current == Some(start + row);
                let marker = if playing { "♪ " } else { "  " };
                ListItem::new(format!("{marker}{}", t.display_name))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" tracks "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if total > 0 {
            state.select(Some(selected_row));
        }
        frame.render_stateful_widget(list, chunks[3], &mut state);
    }

    let footer = Paragraph::new(controls_text(controls.scrub_step))
        .block(Block::default().borders(Borders::ALL).title(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}
