//! Playback control core.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    UI thread (intents, keys)                    │
//! │        drains UiQueue into UiBindings, calls controller        │
//! └───────────────┬─────────────────────────────────▲───────────────┘
//!                 │ handle_intent / handle_key      │ UiUpdate (unbounded)
//!                 ▼                                 │
//! ┌─────────────────────────────────────────────────┴───────────────┐
//! │              PlaybackController (Mutex<Session>)                │
//! │   state machine, seek gesture, repeat policy, volume policy    │
//! └──────┬────────────────────▲──────────────────────▲──────────────┘
//!        │ imperative calls   │ BackendEvent         │ tick()
//!        ▼                    │ (bounded, stamped)   │
//! ┌──────────────────────┐    │           ┌──────────┴──────────────┐
//! │   PlaybackBackend    ├────┘           │ PositionTimer (~50 ms)  │
//! │  engine thread(s)    │                │  dedicated thread       │
//! └──────────────────────┘                └─────────────────────────┘
//! ```
//!
//! Every mutation of the session happens under the controller's lock, so
//! the controller behaves as a monitor regardless of which of the three
//! threads calls it. Nothing reaches the UI except through [`UiQueue`].

mod backend;
mod clock;
mod controller;
mod favorites;
mod keys;
mod queue;
mod state;
mod subscription;
mod timer;
mod track;
mod ui;

pub use backend::{
    BackendError, BackendEvent, EVENT_CHANNEL_CAPACITY, EventSink, EventStream, LoadError,
    PlaybackBackend, event_channel,
};
pub use clock::{
    ClockBackend, ClockConfig, DurationProbe, ERR_UNKNOWN_LENGTH, ERR_UNREADABLE_MEDIA,
};
pub use controller::{Collaborators, ControllerConfig, PlaybackController};
pub use favorites::{FavoriteSet, FavoritesIndex};
pub use keys::{KeyAction, KeyEdge, Keymap, default_bindings};
pub use queue::{PlayQueue, QueueSource};
pub use state::{RepeatMode, SessionSnapshot, TransportState, format_duration};
pub use subscription::{Listeners, Subscription};
pub use timer::{DEFAULT_TICK_PERIOD, PositionTimer};
pub use track::{Track, TrackInfo};
pub use ui::{ErrorKind, ErrorNotice, UiBindings, UiHandle, UiIntent, UiQueue, UiUpdate, ui_channel};

use std::path::PathBuf;

/// Player errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlayerError {
    #[error("Failed to load {path}: {source}")]
    LoadFailure {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error("Playback engine failed ({code}): {message}")]
    BackendFailure { code: i32, message: String },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Position timer has been disposed")]
    TimerDisposed,
}

impl PlayerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }
}

impl From<BackendError> for PlayerError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Disposed => Self::invalid("backend has been disposed"),
            BackendError::Engine { code, message } => Self::BackendFailure { code, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_map_to_taxonomy() {
        let disposed = PlayerError::from(BackendError::Disposed);
        assert!(matches!(disposed, PlayerError::InvalidOperation(_)));

        let engine = PlayerError::from(BackendError::Engine {
            code: 12,
            message: "device lost".into(),
        });
        assert!(matches!(
            engine,
            PlayerError::BackendFailure { code: 12, .. }
        ));
        assert!(engine.to_string().contains("device lost"));
    }

    #[test]
    fn load_failure_keeps_source() {
        use std::error::Error as _;
        let err = PlayerError::LoadFailure {
            path: "/a.mp3".into(),
            source: LoadError::NotFound("/a.mp3".into()),
        };
        assert!(err.source().is_some());
    }
}
