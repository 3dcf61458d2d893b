//! Headless playback backend driven by the wall clock.
//!
//! Nothing is decoded. The backend validates the file on `load`, resolves
//! the media length on its worker thread (so the duration is unknown for
//! the first few polls, like a real engine), advances the position while
//! playing and reports `MediaEnded` when the clock reaches the end.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::backend::{BackendError, BackendEvent, EventSink, LoadError, PlaybackBackend};
use super::track::Track;
use crate::metadata;

/// Engine error code: media properties could not be read.
pub const ERR_UNREADABLE_MEDIA: i32 = 1;
/// Engine error code: media reports no length.
pub const ERR_UNKNOWN_LENGTH: i32 = 2;

/// Level of a silent band in dB.
const SILENCE_DB: f32 = -120.0;

/// Resolves a file's length.
pub type DurationProbe =
    Arc<dyn Fn(&Path) -> crate::error::Result<Option<Duration>> + Send + Sync>;

/// Tunables for [`ClockBackend`].
#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// Worker wake-up interval
    pub poll_interval: Duration,
    /// Number of spectrum bands per visualizer frame
    pub bands: usize,
    /// Spectrum floor in dB; frames are reported relative to it
    pub threshold: i32,
    /// Minimum spacing between visualizer frames
    pub sample_interval: Duration,
    /// Starting volume
    pub volume: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(20),
            bands: 128,
            threshold: -80,
            sample_interval: Duration::from_millis(16),
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Stopped,
    Paused,
    Playing,
}

struct Media {
    id: u64,
    path: PathBuf,
    duration: Option<Duration>,
    probed: bool,
}

struct ClockState {
    media: Option<Media>,
    next_media_id: u64,
    status: Status,
    started_at: Option<Instant>,
    accumulated: Duration,
    /// Reached the end while playing; the clock is frozen until a seek
    ended: bool,
    volume: f64,
    sampling: bool,
    last_sample: Option<Instant>,
    disposed: bool,
}

impl ClockState {
    fn position(&self) -> Duration {
        let raw = self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed());
        match self.media.as_ref().and_then(|m| m.duration) {
            Some(total) => raw.min(total),
            None => raw,
        }
    }

    fn reset_clock(&mut self) {
        self.status = Status::Stopped;
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        self.ended = false;
    }
}

struct Shared {
    state: Mutex<ClockState>,
    wake: Condvar,
}

/// See the module docs.
pub struct ClockBackend {
    shared: Arc<Shared>,
    sink: Option<EventSink>,
    worker: Option<JoinHandle<()>>,
}

impl ClockBackend {
    /// Create a backend that probes durations with lofty.
    pub fn new(sink: EventSink, config: ClockConfig) -> std::io::Result<Self> {
        Self::with_probe(sink, config, Arc::new(|p: &Path| metadata::read_duration(p)))
    }

    /// Create a backend with a custom duration probe.
    pub fn with_probe(
        sink: EventSink,
        config: ClockConfig,
        probe: DurationProbe,
    ) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(ClockState {
                media: None,
                next_media_id: 0,
                status: Status::Stopped,
                started_at: None,
                accumulated: Duration::ZERO,
                ended: false,
                volume: config.volume.clamp(0.0, 1.0),
                sampling: false,
                last_sample: None,
                disposed: false,
            }),
            wake: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker_sink = sink.clone();
        let worker = thread::Builder::new()
            .name("clock-backend".to_string())
            .spawn(move || worker_main(&worker_shared, &worker_sink, &config, &probe))?;

        Ok(Self {
            shared,
            sink: Some(sink),
            worker: Some(worker),
        })
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut ClockState) -> T,
    ) -> Result<T, BackendError> {
        let mut state = self.shared.state.lock();
        if state.disposed {
            return Err(BackendError::Disposed);
        }
        let out = f(&mut state);
        self.shared.wake.notify_all();
        Ok(out)
    }
}

impl PlaybackBackend for ClockBackend {
    fn load(&mut self, track: &Track) -> Result<(), LoadError> {
        let mut state = self.shared.state.lock();
        if state.disposed {
            return Err(LoadError::Disposed);
        }

        // The previous media is gone even if the new one turns out unusable
        state.media = None;
        state.reset_clock();
        if let Some(sink) = &self.sink {
            sink.begin_media();
        }
        self.shared.wake.notify_all();

        let path = track.path();
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }
        File::open(path).map_err(|e| LoadError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        state.next_media_id += 1;
        state.media = Some(Media {
            id: state.next_media_id,
            path: path.to_path_buf(),
            duration: None,
            probed: false,
        });
        self.shared.wake.notify_all();
        Ok(())
    }

    fn play(&mut self) -> Result<(), BackendError> {
        self.with_state(|s| {
            if s.media.is_some() && s.status != Status::Playing {
                s.status = Status::Playing;
                s.started_at = Some(Instant::now());
            }
        })
    }

    fn pause(&mut self) -> Result<(), BackendError> {
        self.with_state(|s| {
            if s.status == Status::Playing {
                s.accumulated = s.position();
                s.started_at = None;
                s.ended = false;
                s.status = Status::Paused;
            }
        })
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        let sink = self.sink.clone();
        self.with_state(|s| {
            if s.media.take().is_some()
                && let Some(sink) = sink
            {
                sink.begin_media();
            }
            s.reset_clock();
        })
    }

    fn seek(&mut self, position: Duration) -> Result<(), BackendError> {
        self.with_state(|s| {
            let Some(total) = s.media.as_ref().and_then(|m| m.duration) else {
                return;
            };
            if total.is_zero() {
                return;
            }
            s.accumulated = position.min(total);
            s.started_at = (s.status == Status::Playing).then(Instant::now);
            s.ended = false;
        })
    }

    fn set_volume(&mut self, volume: f64) -> Result<(), BackendError> {
        self.with_state(|s| s.volume = volume.clamp(0.0, 1.0))
    }

    fn volume(&self) -> Result<f64, BackendError> {
        self.with_state(|s| s.volume)
    }

    fn current_position(&self) -> Result<Duration, BackendError> {
        self.with_state(|s| s.position())
    }

    fn total_duration(&self) -> Result<Option<Duration>, BackendError> {
        self.with_state(|s| s.media.as_ref().and_then(|m| m.duration))
    }

    fn set_visualizer_sampling(&mut self, enabled: bool) -> Result<(), BackendError> {
        self.with_state(|s| s.sampling = enabled)
    }

    fn is_disposed(&self) -> bool {
        self.shared.state.lock().disposed
    }

    fn dispose(&mut self) {
        {
            let mut state = self.shared.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.media = None;
            state.reset_clock();
            self.shared.wake.notify_all();
        }
        self.sink = None;
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!("Clock backend worker panicked");
        }
        tracing::debug!("Clock backend disposed");
    }
}

impl Drop for ClockBackend {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn worker_main(shared: &Shared, sink: &EventSink, config: &ClockConfig, probe: &DurationProbe) {
    let mut state = shared.state.lock();
    loop {
        if state.disposed {
            break;
        }

        // Resolve the length of freshly loaded media outside the lock
        let pending = state
            .media
            .as_mut()
            .filter(|m| !m.probed)
            .map(|m| {
                m.probed = true;
                (m.id, m.path.clone())
            });
        if let Some((id, path)) = pending {
            let probed = MutexGuard::unlocked(&mut state, || probe(&path));
            if state.media.as_ref().is_some_and(|m| m.id == id)
                && let Some(event) = apply_probe(&mut state, &path, probed)
            {
                emit_unlocked(&mut state, sink, event);
            }
            continue;
        }

        if let Some(event) = advance(&mut state, config) {
            emit_unlocked(&mut state, sink, event);
            continue;
        }

        shared.wake.wait_for(&mut state, config.poll_interval);
    }
}

/// Send `event` for the media current under `state` without holding the
/// lock, so a full channel cannot stall backend calls.
fn emit_unlocked(state: &mut MutexGuard<'_, ClockState>, sink: &EventSink, event: BackendEvent) {
    let generation = sink.generation();
    MutexGuard::unlocked(state, || sink.emit_for(generation, event));
}

/// Move the clock forward, returning the event the new position produces.
fn advance(state: &mut ClockState, config: &ClockConfig) -> Option<BackendEvent> {
    if state.status != Status::Playing || state.ended {
        return None;
    }
    let total = state.media.as_ref().and_then(|m| m.duration);
    if let Some(total) = total
        && state.position() >= total
    {
        state.accumulated = total;
        state.started_at = None;
        state.ended = true;
        tracing::debug!("Clock backend reached end of media");
        return Some(BackendEvent::MediaEnded);
    }
    if state.sampling
        && state
            .last_sample
            .is_none_or(|t| t.elapsed() >= config.sample_interval)
    {
        state.last_sample = Some(Instant::now());
        let level = relative_magnitude(SILENCE_DB, config.threshold);
        return Some(BackendEvent::VisualizerSample(vec![level; config.bands]));
    }
    None
}

/// Magnitude above the spectrum floor; anything below the floor reads 0.
fn relative_magnitude(magnitude_db: f32, threshold: i32) -> f32 {
    (magnitude_db - threshold as f32).max(0.0)
}

fn apply_probe(
    state: &mut ClockState,
    path: &Path,
    probed: crate::error::Result<Option<Duration>>,
) -> Option<BackendEvent> {
    match probed {
        Ok(Some(duration)) => {
            if let Some(media) = state.media.as_mut() {
                media.duration = Some(duration);
            }
            None
        }
        Ok(None) => Some(BackendEvent::Error {
            code: ERR_UNKNOWN_LENGTH,
            message: format!("{} reports no length", path.display()),
        }),
        Err(e) => Some(BackendEvent::Error {
            code: ERR_UNREADABLE_MEDIA,
            message: e.to_string(),
        }),
    }
}
