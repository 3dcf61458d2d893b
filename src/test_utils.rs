//! Test utilities and fixtures for cadence tests.
//!
//! This module provides a scriptable mock backend, a recording UI and a
//! recording favorites index so controller tests can observe every call.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{MockBackend, RecordingUi, track};
//!
//! let (sink, events) = event_channel();
//! let (backend, handle) = MockBackend::new(sink);
//! // hand `backend` to the controller, inspect `handle.calls()`
//! ```

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::player::{
    BackendError, BackendEvent, ErrorNotice, EventSink, FavoritesIndex, LoadError,
    PlaybackBackend, Track, UiBindings,
};

/// Creates a track at `/music/<name>.mp3` with no tags.
pub fn track(name: &str) -> Track {
    Track::from_path(format!("/music/{name}.mp3"))
}

/// A state-changing call made on [`MockBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Load(PathBuf),
    Play,
    Pause,
    Stop,
    Seek(Duration),
    SetVolume(f64),
    SetVisualizerSampling(bool),
    Dispose,
}

struct MockState {
    calls: Vec<BackendCall>,
    position: Duration,
    total: Option<Duration>,
    volume: f64,
    fail_load: Option<LoadError>,
    fail_play: Option<BackendError>,
    fail_pause: Option<BackendError>,
    disposed: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            position: Duration::ZERO,
            total: None,
            volume: 1.0,
            fail_load: None,
            fail_play: None,
            fail_pause: None,
            disposed: false,
        }
    }
}

/// Backend that records calls and fails on request.
///
/// Position and duration only change when a test sets them, which makes
/// ticks deterministic.
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    sink: EventSink,
}

/// Test-side view of a [`MockBackend`] owned by a controller.
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
    sink: EventSink,
}

impl MockBackend {
    pub fn new(sink: EventSink) -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        let handle = MockHandle {
            state: Arc::clone(&state),
            sink: sink.clone(),
        };
        (Self { state, sink }, handle)
    }

    fn record(&self, call: BackendCall) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        if state.disposed {
            return Err(BackendError::Disposed);
        }
        state.calls.push(call);
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&MockState) -> T) -> Result<T, BackendError> {
        let state = self.state.lock();
        if state.disposed {
            return Err(BackendError::Disposed);
        }
        Ok(f(&state))
    }
}

impl PlaybackBackend for MockBackend {
    fn load(&mut self, track: &Track) -> Result<(), LoadError> {
        let mut state = self.state.lock();
        if state.disposed {
            return Err(LoadError::Disposed);
        }
        state.calls.push(BackendCall::Load(track.path().to_path_buf()));
        state.position = Duration::ZERO;
        state.total = None;
        self.sink.begin_media();
        match state.fail_load.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn play(&mut self) -> Result<(), BackendError> {
        if let Some(err) = self.state.lock().fail_play.take() {
            return Err(err);
        }
        self.record(BackendCall::Play)
    }

    fn pause(&mut self) -> Result<(), BackendError> {
        if let Some(err) = self.state.lock().fail_pause.take() {
            return Err(err);
        }
        self.record(BackendCall::Pause)
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        self.record(BackendCall::Stop)?;
        self.sink.begin_media();
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), BackendError> {
        self.record(BackendCall::Seek(position))?;
        let mut state = self.state.lock();
        if let Some(total) = state.total.filter(|t| !t.is_zero()) {
            state.position = position.min(total);
        }
        Ok(())
    }

    fn set_volume(&mut self, volume: f64) -> Result<(), BackendError> {
        self.record(BackendCall::SetVolume(volume))?;
        self.state.lock().volume = volume;
        Ok(())
    }

    fn volume(&self) -> Result<f64, BackendError> {
        self.read(|s| s.volume)
    }

    fn current_position(&self) -> Result<Duration, BackendError> {
        self.read(|s| s.position)
    }

    fn total_duration(&self) -> Result<Option<Duration>, BackendError> {
        self.read(|s| s.total)
    }

    fn set_visualizer_sampling(&mut self, enabled: bool) -> Result<(), BackendError> {
        self.record(BackendCall::SetVisualizerSampling(enabled))
    }

    fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    fn dispose(&mut self) {
        let mut state = self.state.lock();
        if !state.disposed {
            state.calls.push(BackendCall::Dispose);
            state.disposed = true;
        }
    }
}

impl MockHandle {
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Positions passed to `seek`, in order.
    pub fn seeks(&self) -> Vec<Duration> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BackendCall::Seek(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    pub fn set_position(&self, position: Duration) {
        self.state.lock().position = position;
    }

    pub fn set_total(&self, total: Option<Duration>) {
        self.state.lock().total = total;
    }

    pub fn fail_next_load(&self, err: LoadError) {
        self.state.lock().fail_load = Some(err);
    }

    pub fn fail_next_play(&self, err: BackendError) {
        self.state.lock().fail_play = Some(err);
    }

    pub fn fail_next_pause(&self, err: BackendError) {
        self.state.lock().fail_pause = Some(err);
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    /// Emit an event as if from the engine thread.
    pub fn emit(&self, event: BackendEvent) -> bool {
        self.sink.emit(event)
    }
}

/// UI that records every update it receives.
#[derive(Debug, Default)]
pub struct RecordingUi {
    pub track_infos: Vec<Option<PathBuf>>,
    pub play_states: Vec<bool>,
    pub positions: Vec<Duration>,
    pub totals: Vec<Duration>,
    pub volumes: Vec<f64>,
    pub favorites: Vec<bool>,
    pub repaints: Vec<PathBuf>,
    pub errors: Vec<ErrorNotice>,
}

impl UiBindings for RecordingUi {
    fn push_track_info(&mut self, track: Option<&Track>) {
        self.track_infos.push(track.map(|t| t.path().to_path_buf()));
    }

    fn push_play_state(&mut self, paused: bool) {
        self.play_states.push(paused);
    }

    fn push_position(&mut self, position: Duration) {
        self.positions.push(position);
    }

    fn push_total_duration(&mut self, total: Duration) {
        self.totals.push(total);
    }

    fn push_volume(&mut self, volume: f64) {
        self.volumes.push(volume);
    }

    fn push_favorite(&mut self, favorite: bool) {
        self.favorites.push(favorite);
    }

    fn repaint_track(&mut self, track: &Track) {
        self.repaints.push(track.path().to_path_buf());
    }

    fn show_error(&mut self, notice: &ErrorNotice) {
        self.errors.push(notice.clone());
    }
}

/// Favorites index that records adds and removes.
#[derive(Debug, Default)]
pub struct RecordingFavorites {
    added: Mutex<Vec<PathBuf>>,
    removed: Mutex<Vec<PathBuf>>,
}

impl RecordingFavorites {
    pub fn added(&self) -> Vec<PathBuf> {
        self.added.lock().clone()
    }

    pub fn removed(&self) -> Vec<PathBuf> {
        self.removed.lock().clone()
    }
}

impl FavoritesIndex for RecordingFavorites {
    fn add_favorite(&self, track: &Track) {
        self.added.lock().push(track.path().to_path_buf());
        track.set_favorite(true);
    }

    fn remove_favorite(&self, track: &Track) {
        self.removed.lock().push(track.path().to_path_buf());
        track.set_favorite(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::event_channel;

    #[test]
    fn test_mock_backend_records_and_fails_once() {
        let (sink, _events) = event_channel();
        let (mut backend, handle) = MockBackend::new(sink);

        handle.fail_next_pause(BackendError::Engine {
            code: 1,
            message: "nope".into(),
        });
        assert!(backend.pause().is_err());
        backend.pause().unwrap();
        backend.seek(Duration::from_secs(3)).unwrap();

        assert_eq!(
            handle.calls(),
            vec![BackendCall::Pause, BackendCall::Seek(Duration::from_secs(3))]
        );
        // Duration unknown, so the seek did not move the position
        assert_eq!(backend.current_position().unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_mock_backend_disposed() {
        let (sink, _events) = event_channel();
        let (mut backend, handle) = MockBackend::new(sink);
        backend.dispose();
        backend.dispose();
        assert!(handle.is_disposed());
        assert_eq!(handle.calls(), vec![BackendCall::Dispose]);
        assert_eq!(backend.play(), Err(BackendError::Disposed));
    }
}
