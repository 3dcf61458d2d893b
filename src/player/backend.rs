//! The contract between the controller and a playback engine.
//!
//! The controller drives the engine imperatively through
//! [`PlaybackBackend`]. The engine talks back asynchronously by emitting
//! [`BackendEvent`]s into an [`EventSink`]; the controller owns the matching
//! [`EventStream`] and applies events one at a time on its own schedule.
//!
//! # Media generations
//!
//! Every event is stamped with the sink's current *media generation*. A
//! backend calls [`EventSink::begin_media`] while it swaps or releases media
//! (in `load` and `stop`), in the same critical section that makes the old
//! media unreachable. Events still in flight for the old media then carry a
//! stale generation and [`EventStream`] drops them before the controller
//! sees them.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::track::Track;

/// Capacity of the backend → controller event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// How long a backend thread waits on a full channel before dropping a
/// control event.
const CONTROL_EVENT_SEND_TIMEOUT: Duration = Duration::from_millis(250);

/// Errors from [`PlaybackBackend::load`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("{0} not found")]
    NotFound(PathBuf),

    #[error("{path} is unreadable: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("backend has been disposed")]
    Disposed,
}

/// Errors from the other backend operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("backend has been disposed")]
    Disposed,

    #[error("engine error {code}: {message}")]
    Engine { code: i32, message: String },
}

/// Asynchronous notifications from the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// The current media played to its end
    MediaEnded,
    /// The engine hit an internal error
    Error { code: i32, message: String },
    /// Spectrum magnitudes, one per band
    VisualizerSample(Vec<f32>),
}

impl BackendEvent {
    /// Visualizer frames are lossy; everything else must be delivered.
    fn is_droppable(&self) -> bool {
        matches!(self, Self::VisualizerSample(_))
    }
}

/// An event plus the media generation it was emitted under.
#[derive(Debug, Clone)]
struct StampedEvent {
    generation: u64,
    event: BackendEvent,
}

/// Sending half held by the backend. Safe to use from any thread.
#[derive(Clone)]
pub struct EventSink {
    tx: Sender<StampedEvent>,
    generation: Arc<AtomicU64>,
}

impl EventSink {
    /// Start a new media generation. Events emitted before this call are
    /// discarded by the controller.
    pub fn begin_media(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// The current media generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Emit an event for the current media.
    ///
    /// Returns false if the event was dropped (channel full or closed).
    pub fn emit(&self, event: BackendEvent) -> bool {
        self.emit_for(self.generation(), event)
    }

    /// Emit an event on behalf of media `generation`, which may have been
    /// superseded since it was read.
    pub fn emit_for(&self, generation: u64, event: BackendEvent) -> bool {
        let stamped = StampedEvent { generation, event };

        if stamped.event.is_droppable() {
            return self.tx.try_send(stamped).is_ok();
        }

        match self.tx.send_timeout(stamped, CONTROL_EVENT_SEND_TIMEOUT) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "Dropping backend event {:?}: controller not draining",
                    e.into_inner().event
                );
                false
            }
        }
    }
}

/// Receiving half owned by the controller.
pub struct EventStream {
    rx: Receiver<StampedEvent>,
    generation: Arc<AtomicU64>,
}

impl EventStream {
    /// Next current-generation event, if one is queued.
    pub fn try_next(&self) -> Option<BackendEvent> {
        while let Ok(stamped) = self.rx.try_recv() {
            if let Some(event) = self.filter(stamped) {
                return Some(event);
            }
        }
        None
    }

    /// Wait up to `timeout` for the next current-generation event.
    ///
    /// `Err(true)` means the sending side is gone.
    pub fn next_timeout(&self, timeout: Duration) -> Result<BackendEvent, bool> {
        loop {
            match self.rx.recv_timeout(timeout) {
                Ok(stamped) => {
                    if let Some(event) = self.filter(stamped) {
                        return Ok(event);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Err(false),
                Err(RecvTimeoutError::Disconnected) => return Err(true),
            }
        }
    }

    fn filter(&self, stamped: StampedEvent) -> Option<BackendEvent> {
        let current = self.generation.load(Ordering::Acquire);
        if stamped.generation == current {
            Some(stamped.event)
        } else {
            tracing::debug!(
                "Discarding stale {:?} (generation {} != {})",
                stamped.event,
                stamped.generation,
                current
            );
            None
        }
    }
}

/// Create a connected sink/stream pair.
pub fn event_channel() -> (EventSink, EventStream) {
    let (tx, rx) = bounded(EVENT_CHANNEL_CAPACITY);
    let generation = Arc::new(AtomicU64::new(0));
    (
        EventSink {
            tx,
            generation: Arc::clone(&generation),
        },
        EventStream { rx, generation },
    )
}

/// A playback engine as seen by the controller.
///
/// After [`dispose`](Self::dispose) every operation must return
/// `Disposed` (or be a no-op); none may panic. `play`, `pause` and `stop`
/// are no-ops when the engine is already in that state.
pub trait PlaybackBackend: Send {
    /// Load `track`, replacing any current media. The engine is left
    /// stopped at the start of the new media. The previous media is
    /// released before `track` is validated, so a failed load leaves the
    /// engine empty. Implementations call [`EventSink::begin_media`] once
    /// the previous media is released.
    fn load(&mut self, track: &Track) -> Result<(), LoadError>;

    fn play(&mut self) -> Result<(), BackendError>;

    fn pause(&mut self) -> Result<(), BackendError>;

    /// Stop and release the current media.
    fn stop(&mut self) -> Result<(), BackendError>;

    /// Seek within the current media. Ignored while the duration is
    /// unknown.
    fn seek(&mut self, position: Duration) -> Result<(), BackendError>;

    fn set_volume(&mut self, volume: f64) -> Result<(), BackendError>;

    fn volume(&self) -> Result<f64, BackendError>;

    fn current_position(&self) -> Result<Duration, BackendError>;

    /// `Ok(None)` until the engine has resolved the media length.
    fn total_duration(&self) -> Result<Option<Duration>, BackendError>;

    /// Turn spectrum sampling on or off.
    fn set_visualizer_sampling(&mut self, enabled: bool) -> Result<(), BackendError> {
        let _ = enabled;
        Ok(())
    }

    fn is_disposed(&self) -> bool;

    /// Release engine resources. Irreversible and idempotent.
    fn dispose(&mut self);
}
