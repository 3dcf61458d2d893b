//! Fixed-period ticker driving position polling.
//!
//! One dedicated thread per timer, parked on a condvar while stopped. The
//! tick callback runs on that thread with the timer's lock released, so
//! ticks never overlap and `stop()` never waits for a slow callback.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::PlayerError;

/// Default tick period.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Stopped,
    Running,
    Disposed,
}

struct Shared {
    state: Mutex<TimerState>,
    wake: Condvar,
}

/// A start/stop periodic task. Once disposed it cannot be restarted.
pub struct PositionTimer {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PositionTimer {
    /// Spawn the timer thread (initially stopped).
    pub fn new<F>(period: Duration, on_tick: F) -> Result<Self, PlayerError>
    where
        F: FnMut() + Send + 'static,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(TimerState::Stopped),
            wake: Condvar::new(),
        });

        let thread_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("position-timer".to_string())
            .spawn(move || run(&thread_shared, period, on_tick))
            .map_err(|e| PlayerError::invalid(format!("failed to spawn timer thread: {e}")))?;

        Ok(Self {
            shared,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Arm the timer. Has no effect if it is already running.
    pub fn start(&self) -> Result<(), PlayerError> {
        let mut state = self.shared.state.lock();
        match *state {
            TimerState::Disposed => Err(PlayerError::TimerDisposed),
            TimerState::Running => Ok(()),
            TimerState::Stopped => {
                *state = TimerState::Running;
                self.shared.wake.notify_all();
                Ok(())
            }
        }
    }

    /// Disarm the timer. A tick already executing finishes; no further tick
    /// starts after this returns.
    pub fn stop(&self) {
        let mut state = self.shared.state.lock();
        if *state == TimerState::Running {
            *state = TimerState::Stopped;
            self.shared.wake.notify_all();
        }
    }

    pub fn is_running(&self) -> bool {
        *self.shared.state.lock() == TimerState::Running
    }

    pub fn is_disposed(&self) -> bool {
        *self.shared.state.lock() == TimerState::Disposed
    }

    /// Terminate the timer thread. Idempotent.
    ///
    /// Joins the thread unless called from a tick callback.
    pub fn dispose(&self) {
        {
            let mut state = self.shared.state.lock();
            *state = TimerState::Disposed;
            self.shared.wake.notify_all();
        }

        let Some(handle) = self.worker.lock().take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            tracing::error!("Position timer thread panicked");
        }
    }
}

impl Drop for PositionTimer {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn run<F>(shared: &Shared, period: Duration, mut on_tick: F)
where
    F: FnMut(),
{
    let mut state = shared.state.lock();
    loop {
        match *state {
            TimerState::Disposed => break,
            TimerState::Stopped => shared.wake.wait(&mut state),
            TimerState::Running => {
                if wait_period(shared, &mut state, period) {
                    MutexGuard::unlocked(&mut state, &mut on_tick);
                }
            }
        }
    }
    tracing::debug!("Position timer thread exiting");
}

/// Sleep one period. Returns true if the timer is still running at the end.
fn wait_period(shared: &Shared, state: &mut MutexGuard<'_, TimerState>, period: Duration) -> bool {
    let deadline = Instant::now() + period;
    while **state == TimerState::Running {
        if shared.wake.wait_until(state, deadline).timed_out() {
            return **state == TimerState::Running;
        }
    }
    false
}
