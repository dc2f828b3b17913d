//! Application module: the view model behind the TUI.
//!
//! `App` holds the catalog and the cursor; `NowPlaying` merges the
//! player's state stream into what the status bar renders.

mod model;
mod now_playing;

pub use model::App;
pub use now_playing::{NowPlaying, UiState};
