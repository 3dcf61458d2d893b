//! Session state types shared between the controller and its readers.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::track::Track;

/// Whether anything is loaded, and if so whether it is playing.
///
/// `Paused` and `Playing` are the two flavours of "loaded"; `Empty` means no
/// current track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Empty,
    Paused,
    Playing,
}

/// What happens when the backend reports the end of the current track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatMode {
    /// Restart the same track
    RepeatOne,
    /// Advance through the queue
    #[default]
    RepeatAll,
    /// Pause at the end of the track
    NoRepeat,
}

/// A consistent copy of the controller's session, taken under its lock.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Loaded track, if any
    pub current_track: Option<Track>,
    /// Transport state; `Empty` exactly when `current_track` is `None`
    pub transport: TransportState,
    /// Active repeat policy
    pub repeat_mode: RepeatMode,
    /// Volume in `[0, 1]`; `None` until read from the backend
    pub volume: Option<f64>,
    /// Last known play position
    pub position: Duration,
    /// Total duration as last reported by the backend
    pub total_duration: Option<Duration>,
    /// A seek gesture is being accumulated
    pub is_seeking: bool,
    /// Pending seek offset in milliseconds (negative = backwards)
    pub seek_offset_ms: i64,
}

/// Format a duration as MM:SS or HH:MM:SS.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}
