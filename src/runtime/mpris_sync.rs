use crate::app::{App, NowPlaying};
use crate::mpris::{MprisHandle, PlaybackStatus};

fn status_for(np: &NowPlaying) -> PlaybackStatus {
    match (np.current, np.is_playing) {
        (None, _) => PlaybackStatus::Stopped,
        (Some(_), true) => PlaybackStatus::Playing,
        (Some(_), false) => PlaybackStatus::Paused,
    }
}

/// Pushes app state to MPRIS only when the track or status changed.
#[derive(Default)]
pub struct MprisSync {
    last: Option<(Option<usize>, PlaybackStatus)>,
}

impl MprisSync {
    pub fn update(&mut self, mpris: &MprisHandle, app: &App) {
        let np = &app.now_playing;
        let now = (np.current, status_for(np));
        if self.last == Some(now) {
            return;
        }
        if self.last.map(|(i, _)| i) != Some(now.0) {
            mpris.set_track_metadata(app.current_track());
        }
        mpris.set_status(now.1);
        self.last = Some(now);
    }
}
