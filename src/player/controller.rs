//! The playback controller.
//!
//! [`PlaybackController`] is a cheap, clonable handle. All session state
//! sits behind one lock; every public operation takes it once and works on
//! `&mut Session`, so repeat-mode handling can load the next track without
//! re-entering the lock. Failures never escape a public operation: they are
//! logged and pushed to the UI as [`UiUpdate::Error`].

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::PlayerError;
use super::backend::{BackendEvent, EventStream, PlaybackBackend};
use super::favorites::FavoritesIndex;
use super::keys::{KeyAction, KeyEdge};
use super::queue::QueueSource;
use super::state::{RepeatMode, SessionSnapshot, TransportState};
use super::subscription::{Listeners, Subscription};
use super::timer::{DEFAULT_TICK_PERIOD, PositionTimer};
use super::track::Track;
use super::ui::{ErrorNotice, UiHandle, UiIntent, UiUpdate};

/// How long the event loop waits for a backend event before re-checking
/// for disposal.
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Controller tunables, fixed at construction.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Position polling period
    pub tick_period: Duration,
    /// Offset added per seek key press
    pub seek_step: Duration,
    /// Volume change per volume key press
    pub volume_step: f64,
    /// Starting repeat policy
    pub repeat_mode: RepeatMode,
    /// Volume to apply at startup; `None` adopts the backend's volume
    pub initial_volume: Option<f64>,
    /// Enable visualizer sampling at startup
    pub visualizer: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
            seek_step: Duration::from_secs(5),
            volume_step: 0.05,
            repeat_mode: RepeatMode::default(),
            initial_volume: None,
            visualizer: false,
        }
    }
}

/// The controller's external collaborators.
///
/// The queue and favorites index are called with the session lock held
/// and must not call back into the controller.
pub struct Collaborators {
    pub queue: Arc<dyn QueueSource>,
    pub favorites: Arc<dyn FavoritesIndex>,
    pub ui: UiHandle,
}

#[derive(Debug, Clone, Copy)]
struct SeekGesture {
    /// Resume playback when the gesture is committed
    resume: bool,
    /// Accumulated offset in milliseconds
    offset_ms: i64,
}

struct Loaded {
    track: Track,
    playing: bool,
    total: Option<Duration>,
    seek: Option<SeekGesture>,
}

struct Session {
    backend: Box<dyn PlaybackBackend>,
    current: Option<Loaded>,
    repeat_mode: RepeatMode,
    volume: Option<f64>,
    position: Duration,
}

impl Session {
    fn transport(&self) -> TransportState {
        match &self.current {
            None => TransportState::Empty,
            Some(loaded) if loaded.playing => TransportState::Playing,
            Some(_) => TransportState::Paused,
        }
    }
}

struct Inner {
    session: Mutex<Session>,
    disposed: AtomicBool,
    timer: PositionTimer,
    events: EventStream,
    queue: Arc<dyn QueueSource>,
    favorites: Arc<dyn FavoritesIndex>,
    ui: UiHandle,
    visualizer: Listeners<Vec<f32>>,
    seek_step: Duration,
    volume_step: f64,
}

/// Orchestrates a [`PlaybackBackend`], a [`PositionTimer`] and the UI.
#[derive(Clone)]
pub struct PlaybackController {
    inner: Arc<Inner>,
}

impl PlaybackController {
    /// Build a controller around `backend`.
    ///
    /// `events` must be the stream paired with the sink the backend emits
    /// into.
    pub fn new(
        mut backend: Box<dyn PlaybackBackend>,
        events: EventStream,
        collaborators: Collaborators,
        config: ControllerConfig,
    ) -> Result<Self, PlayerError> {
        let Collaborators {
            queue,
            favorites,
            ui,
        } = collaborators;

        let volume = initial_volume(backend.as_mut(), config.initial_volume);
        if let Some(v) = volume {
            ui.push(UiUpdate::Volume(v));
        }
        if config.visualizer
            && let Err(e) = backend.set_visualizer_sampling(true)
        {
            tracing::warn!("Could not enable visualizer sampling: {}", e);
        }

        let slot: Arc<OnceLock<Weak<Inner>>> = Arc::default();
        let timer_slot = Arc::clone(&slot);
        let timer = PositionTimer::new(config.tick_period, move || {
            if let Some(inner) = timer_slot.get().and_then(Weak::upgrade) {
                inner.tick();
            }
        })?;

        let inner = Arc::new(Inner {
            session: Mutex::new(Session {
                backend,
                current: None,
                repeat_mode: config.repeat_mode,
                volume,
                position: Duration::ZERO,
            }),
            disposed: AtomicBool::new(false),
            timer,
            events,
            queue,
            favorites,
            ui,
            visualizer: Listeners::new(),
            seek_step: config.seek_step,
            volume_step: config.volume_step,
        });
        let _ = slot.set(Arc::downgrade(&inner));

        tracing::debug!(
            "Playback controller ready (tick {:?}, repeat {:?})",
            config.tick_period,
            config.repeat_mode
        );
        Ok(Self { inner })
    }

    /// Load `track`, or unload with `None`. A loaded track always starts
    /// paused.
    pub fn load(&self, track: Option<Track>) {
        self.inner.run("load", |inner, s| inner.load(s, track));
    }

    pub fn play(&self) {
        self.inner.run("play", |inner, s| inner.play(s));
    }

    pub fn pause(&self) {
        self.inner.run("pause", |inner, s| inner.pause(s));
    }

    pub fn toggle_play_pause(&self) {
        self.inner.run("toggle", |inner, s| inner.toggle(s));
    }

    /// Pause and unload. Always completes.
    pub fn stop(&self) {
        self.inner.run("stop", |inner, s| {
            inner.stop(s);
            Ok(())
        });
    }

    /// Seek the current track back to its start without reloading.
    pub fn restart(&self) {
        self.inner
            .run("restart", |inner, s| inner.seek_to(s, Duration::ZERO));
    }

    /// Seek to an absolute position, clamped to the known duration.
    pub fn seek(&self, position: Duration) {
        self.inner.run("seek", |inner, s| inner.seek_to(s, position));
    }

    pub fn next(&self) {
        self.inner
            .run("next", |inner, s| inner.skip(s, |q| q.next()));
    }

    pub fn previous(&self) {
        self.inner
            .run("previous", |inner, s| inner.skip(s, |q| q.previous()));
    }

    /// Set the volume, clamped to `[0, 1]`. Setting the current value is a
    /// no-op.
    pub fn set_volume(&self, volume: f64) {
        self.inner
            .run("set_volume", |inner, s| inner.set_volume(s, volume));
    }

    pub fn set_repeat_mode(&self, mode: RepeatMode) {
        self.inner.run("set_repeat_mode", |_, s| {
            s.repeat_mode = mode;
            Ok(())
        });
    }

    pub fn shuffle(&self) {
        self.inner.run("shuffle", |inner, _| {
            inner.queue.shuffle();
            Ok(())
        });
    }

    pub fn unshuffle(&self) {
        self.inner.run("unshuffle", |inner, _| {
            inner.queue.unshuffle();
            Ok(())
        });
    }

    /// Add or remove the current track from favorites.
    pub fn set_favorite(&self, favorite: bool) {
        self.inner
            .run("set_favorite", |inner, s| inner.set_favorite(s, favorite));
    }

    pub fn toggle_favorite(&self) {
        self.inner.run("toggle_favorite", |inner, s| {
            let favorite = s.current.as_ref().is_some_and(|c| !c.track.is_favorite());
            inner.set_favorite(s, favorite)
        });
    }

    pub fn set_visualizer_sampling(&self, enabled: bool) {
        self.inner.run("set_visualizer_sampling", |_, s| {
            s.backend.set_visualizer_sampling(enabled)?;
            Ok(())
        });
    }

    /// Receive every visualizer frame until the handle is dropped or
    /// unsubscribed. Frames are magnitudes relative to the spectrum floor.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe_visualizer<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Vec<f32>) + Send + Sync + 'static,
    {
        self.inner.visualizer.subscribe(listener)
    }

    /// Apply a logical key event.
    pub fn handle_key(&self, action: KeyAction, edge: KeyEdge) {
        match (action, edge) {
            (KeyAction::PlayPause, KeyEdge::Released) => self.toggle_play_pause(),
            (KeyAction::PlayPause, KeyEdge::Pressed) => {}
            (KeyAction::SeekBackward, KeyEdge::Pressed) => {
                self.inner.run("seek_press", |inner, s| inner.seek_press(s, false));
            }
            (KeyAction::SeekForward, KeyEdge::Pressed) => {
                self.inner.run("seek_press", |inner, s| inner.seek_press(s, true));
            }
            (KeyAction::SeekBackward | KeyAction::SeekForward, KeyEdge::Released) => {
                self.inner.run("seek_release", |inner, s| inner.seek_release(s));
            }
            (KeyAction::VolumeUp, KeyEdge::Pressed) => self.step_volume(1.0),
            (KeyAction::VolumeDown, KeyEdge::Pressed) => self.step_volume(-1.0),
            (KeyAction::VolumeUp | KeyAction::VolumeDown, KeyEdge::Released) => {}
        }
    }

    /// Apply an intent from the UI.
    pub fn handle_intent(&self, intent: UiIntent) {
        match intent {
            UiIntent::Seek(position) => self.seek(position),
            UiIntent::PlayPauseToggle => self.toggle_play_pause(),
            UiIntent::VolumeChange(volume) => self.set_volume(volume),
            UiIntent::Next => self.next(),
            UiIntent::Previous => self.previous(),
            UiIntent::ShuffleToggle(true) => self.shuffle(),
            UiIntent::ShuffleToggle(false) => self.unshuffle(),
            UiIntent::FavoriteToggle(favorite) => self.set_favorite(favorite),
        }
    }

    /// Apply every queued backend event on the calling thread.
    pub fn drain_events(&self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.inner.events.try_next() {
            self.inner.apply_event(event);
            applied += 1;
        }
        applied
    }

    /// Start a thread that applies backend events as they arrive. It exits
    /// once the controller is disposed or dropped.
    pub fn spawn_event_loop(&self) -> std::io::Result<JoinHandle<()>> {
        let weak = Arc::downgrade(&self.inner);
        thread::Builder::new()
            .name("controller-events".to_string())
            .spawn(move || {
                loop {
                    let Some(inner) = weak.upgrade() else { break };
                    if inner.disposed.load(Ordering::Acquire) {
                        break;
                    }
                    match inner.events.next_timeout(EVENT_POLL_INTERVAL) {
                        Ok(event) => inner.apply_event(event),
                        Err(true) => break,
                        Err(false) => {}
                    }
                }
                tracing::debug!("Controller event loop exiting");
            })
    }

    /// Dispose the timer, then the backend. Idempotent; afterwards every
    /// operation is rejected.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        // The timer thread takes the session lock on every tick
        self.inner.timer.dispose();

        let mut session = self.inner.session.lock();
        session.current = None;
        session.position = Duration::ZERO;
        session.backend.dispose();
        tracing::info!("Playback controller disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// A consistent copy of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        let s = self.inner.session.lock();
        let seek = s.current.as_ref().and_then(|c| c.seek);
        SessionSnapshot {
            current_track: s.current.as_ref().map(|c| c.track.clone()),
            transport: s.transport(),
            repeat_mode: s.repeat_mode,
            volume: s.volume,
            position: s.position,
            total_duration: s.current.as_ref().and_then(|c| c.total),
            is_seeking: seek.is_some(),
            seek_offset_ms: seek.map_or(0, |g| g.offset_ms),
        }
    }

    pub fn transport(&self) -> TransportState {
        self.inner.session.lock().transport()
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.inner.session.lock().repeat_mode
    }

    /// One position poll. Normally driven by the position timer.
    pub(crate) fn tick(&self) {
        self.inner.tick();
    }

    fn step_volume(&self, direction: f64) {
        self.inner.run("step_volume", |inner, s| {
            let base = s.volume.unwrap_or(1.0);
            inner.set_volume(s, base + direction * inner.volume_step)
        });
    }
}

impl Inner {
    /// Run `op` under the session lock and report any failure.
    fn run<F>(&self, name: &str, op: F)
    where
        F: FnOnce(&Self, &mut Session) -> Result<(), PlayerError>,
    {
        if self.disposed.load(Ordering::Acquire) {
            self.report(PlayerError::invalid(format!(
                "{name} called on a disposed controller"
            )));
            return;
        }
        let mut session = self.session.lock();
        if let Err(e) = op(self, &mut session) {
            self.report(e);
        }
    }

    fn report(&self, err: PlayerError) {
        match &err {
            PlayerError::InvalidOperation(_) | PlayerError::TimerDisposed => {
                tracing::warn!("Rejected: {}", err);
            }
            _ => tracing::error!("{}", err),
        }
        self.ui.push(UiUpdate::Error(ErrorNotice::from(&err)));
    }

    fn load(&self, s: &mut Session, track: Option<Track>) -> Result<(), PlayerError> {
        let Some(track) = track else {
            self.unload(s);
            return Ok(());
        };

        self.timer.start()?;
        s.current = None;
        s.position = Duration::ZERO;

        if let Err(source) = s.backend.load(&track) {
            self.timer.stop();
            if let Err(e) = s.backend.stop() {
                tracing::debug!("Backend stop after failed load: {}", e);
            }
            self.push_track(None);
            return Err(PlayerError::LoadFailure {
                path: track.path().to_path_buf(),
                source,
            });
        }

        tracing::info!("Loaded {}", track.path().display());
        let total = track.duration();
        s.current = Some(Loaded {
            track: track.clone(),
            playing: false,
            total,
            seek: None,
        });
        self.queue.set_active(&track);
        self.push_track(Some(&track));
        self.ui.push(UiUpdate::Position(Duration::ZERO));
        if let Some(total) = total {
            self.ui.push(UiUpdate::TotalDuration(total));
        }
        Ok(())
    }

    /// Release the current track and stop polling.
    fn unload(&self, s: &mut Session) {
        self.timer.stop();
        if s.current.take().is_some()
            && let Err(e) = s.backend.stop()
        {
            tracing::warn!("Backend stop failed: {}", e);
        }
        s.position = Duration::ZERO;
        self.push_track(None);
    }

    fn push_track(&self, track: Option<&Track>) {
        self.ui.push(UiUpdate::TrackInfo(track.cloned()));
        self.ui
            .push(UiUpdate::Favorite(track.is_some_and(Track::is_favorite)));
        self.ui.push(UiUpdate::PlayState { paused: true });
    }

    fn play(&self, s: &mut Session) -> Result<(), PlayerError> {
        let Some(current) = s.current.as_mut() else {
            return Ok(());
        };
        if let Some(gesture) = current.seek.as_mut() {
            gesture.resume = true;
            return Ok(());
        }
        s.backend.play()?;
        current.playing = true;
        self.ui.push(UiUpdate::PlayState { paused: false });
        Ok(())
    }

    fn pause(&self, s: &mut Session) -> Result<(), PlayerError> {
        let Some(current) = s.current.as_mut() else {
            return Ok(());
        };
        if let Some(gesture) = current.seek.as_mut() {
            gesture.resume = false;
            return Ok(());
        }
        if !current.playing {
            return Ok(());
        }
        s.backend.pause()?;
        current.playing = false;
        self.ui.push(UiUpdate::PlayState { paused: true });
        Ok(())
    }

    fn toggle(&self, s: &mut Session) -> Result<(), PlayerError> {
        let Some(current) = s.current.as_ref() else {
            return Ok(());
        };
        let playing = current.seek.map_or(current.playing, |g| g.resume);
        if playing { self.pause(s) } else { self.play(s) }
    }

    fn stop(&self, s: &mut Session) {
        if let Err(e) = self.pause(s) {
            tracing::warn!("Pause before stop failed: {}", e);
        }
        self.unload(s);
        self.ui.push(UiUpdate::Position(Duration::ZERO));
        self.ui.push(UiUpdate::TotalDuration(Duration::ZERO));
    }

    fn seek_to(&self, s: &mut Session, position: Duration) -> Result<(), PlayerError> {
        let Some(current) = s.current.as_ref() else {
            return Ok(());
        };
        let target = current.total.map_or(position, |total| position.min(total));
        s.backend.seek(target)?;
        self.commit_position(s, target);
        Ok(())
    }

    /// Record where a successful seek landed. Backends ignore seeks while
    /// the length is unknown, so the target is only trusted once it is.
    fn commit_position(&self, s: &mut Session, target: Duration) {
        let length_known = s
            .current
            .as_ref()
            .and_then(|c| c.total)
            .is_some_and(|total| !total.is_zero());
        if length_known {
            s.position = target;
        } else if let Ok(now) = s.backend.current_position() {
            s.position = now;
        }
        self.ui.push(UiUpdate::Position(s.position));
    }

    fn seek_press(&self, s: &mut Session, forward: bool) -> Result<(), PlayerError> {
        let Session {
            backend,
            current,
            position,
            ..
        } = s;
        let Some(current) = current.as_mut() else {
            return Ok(());
        };

        let gesture = current.seek.get_or_insert(SeekGesture {
            resume: current.playing,
            offset_ms: 0,
        });
        let step = i64::try_from(self.seek_step.as_millis()).unwrap_or(i64::MAX);
        gesture.offset_ms = if forward {
            gesture.offset_ms.saturating_add(step)
        } else {
            gesture.offset_ms.saturating_sub(step)
        };
        let preview = offset_position(*position, gesture.offset_ms, current.total);

        if current.playing {
            if let Err(e) = backend.pause() {
                current.seek = None;
                return Err(e.into());
            }
            current.playing = false;
            self.ui.push(UiUpdate::PlayState { paused: true });
        }
        self.ui.push(UiUpdate::Position(preview));
        Ok(())
    }

    fn seek_release(&self, s: &mut Session) -> Result<(), PlayerError> {
        let Some(current) = s.current.as_mut() else {
            return Ok(());
        };
        let Some(gesture) = current.seek.take() else {
            return Ok(());
        };

        let target = offset_position(s.position, gesture.offset_ms, current.total);
        tracing::debug!("Committing seek to {:?}", target);
        let seeked = s.backend.seek(target);
        if seeked.is_ok() {
            self.commit_position(s, target);
        }
        if gesture.resume {
            self.play(s)?;
        }
        seeked.map_err(Into::into)
    }

    fn skip(
        &self,
        s: &mut Session,
        pick: impl FnOnce(&dyn QueueSource) -> Option<Track>,
    ) -> Result<(), PlayerError> {
        let was_playing = s
            .current
            .as_ref()
            .is_some_and(|c| c.seek.map_or(c.playing, |g| g.resume));
        match pick(self.queue.as_ref()) {
            Some(track) => {
                self.load(s, Some(track))?;
                if was_playing {
                    self.play(s)?;
                }
                Ok(())
            }
            None => {
                self.stop(s);
                Ok(())
            }
        }
    }

    fn set_volume(&self, s: &mut Session, volume: f64) -> Result<(), PlayerError> {
        if volume.is_nan() {
            return Err(PlayerError::invalid("volume is not a number"));
        }
        let volume = volume.clamp(0.0, 1.0);
        if s.volume == Some(volume) {
            return Ok(());
        }
        s.backend.set_volume(volume)?;
        s.volume = Some(volume);
        self.ui.push(UiUpdate::Volume(volume));
        Ok(())
    }

    fn set_favorite(&self, s: &mut Session, favorite: bool) -> Result<(), PlayerError> {
        let Some(current) = s.current.as_ref() else {
            return Ok(());
        };
        if favorite {
            self.favorites.add_favorite(&current.track);
        } else {
            self.favorites.remove_favorite(&current.track);
        }
        self.ui.push(UiUpdate::Favorite(favorite));
        Ok(())
    }

    fn tick(&self) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        let mut session = self.session.lock();
        let Session {
            backend,
            current,
            position,
            ..
        } = &mut *session;
        if backend.is_disposed() {
            return;
        }
        let Some(current) = current.as_mut() else {
            return;
        };
        if current.seek.is_some() {
            return;
        }

        match backend.current_position() {
            Ok(now) => {
                *position = now;
                self.ui.push(UiUpdate::Position(now));
            }
            Err(e) => {
                tracing::debug!("Tick skipped: {}", e);
                return;
            }
        }

        if let Ok(Some(total)) = backend.total_duration()
            && current.total != Some(total)
        {
            current.total = Some(total);
            self.ui.push(UiUpdate::TotalDuration(total));
            if current.track.set_duration(total) {
                self.ui
                    .push(UiUpdate::TrackDurationChanged(current.track.clone()));
            }
        }
    }

    fn apply_event(&self, event: BackendEvent) {
        match event {
            BackendEvent::VisualizerSample(frame) => self.visualizer.emit(&frame),
            BackendEvent::MediaEnded => self.run("media_ended", |inner, s| inner.media_ended(s)),
            BackendEvent::Error { code, message } => self.run("backend_error", |inner, s| {
                inner.stop(s);
                Err(PlayerError::BackendFailure { code, message })
            }),
        }
    }

    fn media_ended(&self, s: &mut Session) -> Result<(), PlayerError> {
        if !s.current.as_ref().is_some_and(|c| c.playing) {
            tracing::debug!("Ignoring end of media while not playing");
            return Ok(());
        }
        match s.repeat_mode {
            RepeatMode::RepeatOne => self.seek_to(s, Duration::ZERO),
            RepeatMode::RepeatAll => match self.queue.next() {
                Some(track) => {
                    self.load(s, Some(track))?;
                    self.play(s)
                }
                None => {
                    self.stop(s);
                    Ok(())
                }
            },
            RepeatMode::NoRepeat => self.pause(s),
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.timer.dispose();
        self.session.get_mut().backend.dispose();
    }
}

/// `position + offset_ms`, floored at zero and capped at `total` if known.
fn offset_position(position: Duration, offset_ms: i64, total: Option<Duration>) -> Duration {
    let delta = Duration::from_millis(offset_ms.unsigned_abs());
    let target = if offset_ms >= 0 {
        position.saturating_add(delta)
    } else {
        position.saturating_sub(delta)
    };
    total.map_or(target, |total| target.min(total))
}

/// Apply the configured startup volume, or adopt the backend's.
fn initial_volume(backend: &mut dyn PlaybackBackend, configured: Option<f64>) -> Option<f64> {
    if let Some(volume) = configured.filter(|v| !v.is_nan()) {
        let volume = volume.clamp(0.0, 1.0);
        match backend.set_volume(volume) {
            Ok(()) => return Some(volume),
            Err(e) => tracing::warn!("Could not apply initial volume: {}", e),
        }
    }
    match backend.volume() {
        Ok(volume) => Some(volume.clamp(0.0, 1.0)),
        Err(e) => {
            tracing::warn!("Could not read backend volume: {}", e);
            None
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::player::backend::event_channel;
    use crate::player::queue::PlayQueue;
    use crate::player::ui::ui_channel;
    use crate::test_utils::{MockBackend, RecordingFavorites, track};
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Load(Option<u8>),
        Play,
        Pause,
        Stop,
        SeekPress(bool),
        SeekRelease,
        MediaEnded,
        Next,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            prop::option::of(0u8..4).prop_map(Op::Load),
            Just(Op::Play),
            Just(Op::Pause),
            Just(Op::Stop),
            any::<bool>().prop_map(Op::SeekPress),
            Just(Op::SeekRelease),
            Just(Op::MediaEnded),
            Just(Op::Next),
        ]
    }

    proptest! {
        #[test]
        fn empty_iff_no_track(ops in prop::collection::vec(op(), 1..40)) {
            let (sink, events) = event_channel();
            let (backend, mock) = MockBackend::new(sink);
            let (ui, _queue) = ui_channel();
            let queue = PlayQueue::from_tracks((0..3).map(|i| track(&i.to_string())));
            let controller = PlaybackController::new(
                Box::new(backend),
                events,
                Collaborators {
                    queue: Arc::new(parking_lot::Mutex::new(queue)),
                    favorites: Arc::new(RecordingFavorites::default()),
                    ui,
                },
                ControllerConfig {
                    tick_period: Duration::from_secs(3600),
                    ..Default::default()
                },
            )
            .unwrap();

            for op in ops {
                match op {
                    Op::Load(i) => controller.load(i.map(|i| track(&i.to_string()))),
                    Op::Play => controller.play(),
                    Op::Pause => controller.pause(),
                    Op::Stop => controller.stop(),
                    Op::SeekPress(fwd) => {
                        let action = if fwd { KeyAction::SeekForward } else { KeyAction::SeekBackward };
                        controller.handle_key(action, KeyEdge::Pressed);
                    }
                    Op::SeekRelease => controller.handle_key(KeyAction::SeekForward, KeyEdge::Released),
                    Op::MediaEnded => {
                        mock.emit(BackendEvent::MediaEnded);
                        controller.drain_events();
                    }
                    Op::Next => controller.next(),
                }
                let snap = controller.snapshot();
                prop_assert_eq!(snap.transport == TransportState::Empty, snap.current_track.is_none());
                prop_assert!(!snap.is_seeking || snap.current_track.is_some());
            }
        }

        #[test]
        fn volume_always_in_range(values in prop::collection::vec(-10.0f64..10.0, 1..20)) {
            let (sink, events) = event_channel();
            let (backend, _mock) = MockBackend::new(sink);
            let (ui, _queue) = ui_channel();
            let controller = PlaybackController::new(
                Box::new(backend),
                events,
                Collaborators {
                    queue: Arc::new(parking_lot::Mutex::new(PlayQueue::new())),
                    favorites: Arc::new(RecordingFavorites::default()),
                    ui,
                },
                ControllerConfig {
                    tick_period: Duration::from_secs(3600),
                    ..Default::default()
                },
            )
            .unwrap();

            for v in values {
                controller.set_volume(v);
                let volume = controller.snapshot().volume.unwrap();
                prop_assert!((0.0..=1.0).contains(&volume));
            }
        }

        #[test]
        fn backward_seek_never_negative(start in 0u64..600_000, presses in 1i64..50) {
            let target = offset_position(Duration::from_millis(start), -5_000 * presses, None);
            let expected = start.saturating_sub(5_000 * presses as u64);
            prop_assert_eq!(target, Duration::from_millis(expected));
        }
    }
}
