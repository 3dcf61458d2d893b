//! The controller ↔ UI boundary.
//!
//! The controller never touches widgets. It enqueues [`UiUpdate`]s on a
//! [`UiHandle`] and returns immediately; the UI layer owns the matching
//! [`UiQueue`] and drains it on its own thread into a [`UiBindings`]
//! implementation. Intents travel the other way as [`UiIntent`]s.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::fmt;
use std::time::Duration;

use super::PlayerError;
use super::track::Track;

/// A state change for the UI to apply.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    TrackInfo(Option<Track>),
    PlayState { paused: bool },
    Position(Duration),
    TotalDuration(Duration),
    Volume(f64),
    Favorite(bool),
    /// The track's cached duration changed; repaint views showing it
    TrackDurationChanged(Track),
    Error(ErrorNotice),
}

impl UiUpdate {
    /// Apply this update to `ui`.
    pub fn apply_to<U: UiBindings + ?Sized>(self, ui: &mut U) {
        match self {
            Self::TrackInfo(track) => ui.push_track_info(track.as_ref()),
            Self::PlayState { paused } => ui.push_play_state(paused),
            Self::Position(position) => ui.push_position(position),
            Self::TotalDuration(total) => ui.push_total_duration(total),
            Self::Volume(volume) => ui.push_volume(volume),
            Self::Favorite(favorite) => ui.push_favorite(favorite),
            Self::TrackDurationChanged(track) => ui.repaint_track(&track),
            Self::Error(notice) => ui.show_error(&notice),
        }
    }
}

/// Widgets the controller publishes to.
pub trait UiBindings {
    fn push_track_info(&mut self, track: Option<&Track>);

    fn push_play_state(&mut self, paused: bool);

    fn push_position(&mut self, position: Duration);

    fn push_total_duration(&mut self, total: Duration);

    fn push_volume(&mut self, volume: f64);

    fn push_favorite(&mut self, favorite: bool);

    /// Repaint any view keyed to `track`.
    fn repaint_track(&mut self, track: &Track) {
        let _ = track;
    }

    /// Error-display collaborator.
    fn show_error(&mut self, notice: &ErrorNotice);
}

/// User intents coming from the playback bar and transport buttons.
#[derive(Debug, Clone, PartialEq)]
pub enum UiIntent {
    Seek(Duration),
    PlayPauseToggle,
    VolumeChange(f64),
    Next,
    Previous,
    ShuffleToggle(bool),
    FavoriteToggle(bool),
}

/// Broad class of a surfaced failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LoadFailure,
    BackendFailure,
    InvalidOperation,
}

/// A failure as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub kind: ErrorKind,
    pub code: Option<i32>,
    pub message: String,
}

impl From<&PlayerError> for ErrorNotice {
    fn from(err: &PlayerError) -> Self {
        let kind = match err {
            PlayerError::LoadFailure { .. } => ErrorKind::LoadFailure,
            PlayerError::BackendFailure { .. } => ErrorKind::BackendFailure,
            PlayerError::InvalidOperation(_) | PlayerError::TimerDisposed => {
                ErrorKind::InvalidOperation
            }
        };
        let (code, message) = match err {
            PlayerError::BackendFailure { code, message } => (Some(*code), message.clone()),
            other => (None, other.to_string()),
        };
        Self {
            kind,
            code,
            message,
        }
    }
}

impl fmt::Display for ErrorNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}:{}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Producer side, held by the controller.
#[derive(Clone)]
pub struct UiHandle {
    tx: Sender<UiUpdate>,
}

impl UiHandle {
    /// Enqueue an update. Never blocks; dropped if the UI is gone.
    pub fn push(&self, update: UiUpdate) {
        if self.tx.send(update).is_err() {
            tracing::trace!("UI queue closed, update dropped");
        }
    }
}

/// Consumer side, owned by the UI thread.
pub struct UiQueue {
    rx: Receiver<UiUpdate>,
}

impl UiQueue {
    /// Apply every queued update to `ui`. Returns how many were applied.
    pub fn drain_into<U: UiBindings + ?Sized>(&self, ui: &mut U) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.rx.try_recv() {
            update.apply_to(ui);
            applied += 1;
        }
        applied
    }

    /// Wait up to `timeout` for one update.
    ///
    /// `Err(true)` means every producer is gone.
    pub fn next_timeout(&self, timeout: Duration) -> Result<UiUpdate, bool> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => false,
            RecvTimeoutError::Disconnected => true,
        })
    }
}

/// Create a connected handle/queue pair.
pub fn ui_channel() -> (UiHandle, UiQueue) {
    let (tx, rx) = unbounded();
    (UiHandle { tx }, UiQueue { rx })
}
