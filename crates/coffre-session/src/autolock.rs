//! Auto-lock countdown for an unlocked vault session.
//!
//! The timer holds no key material. When it fires it invokes the owner's
//! callback, which is expected to drop (and thereby zeroize) its MEK copy
//! and return the UI to the locked state. Firing and an in-flight
//! plaintext-revealing operation are not synchronized here — the owner
//! treats the callback as a request and finishes its critical section
//! first.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

type FireCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// A cancellable, resettable one-shot lock timer.
///
/// All mutation is serialized by one internal lock. The scheduled task
/// re-acquires that lock when it wakes and releases it *before* running the
/// callback, so the callback may freely call [`start`](Self::start),
/// [`reset`](Self::reset) or [`stop`](Self::stop) on the same timer.
///
/// After a fire the timer is idle; arming again requires a new `start`.
/// Must be used from within a tokio runtime.
pub struct AutoLockTimer {
    state: Arc<Mutex<TimerState>>,
}

struct TimerState {
    timeout: Duration,
    deadline: Option<Instant>,
    callback: Option<FireCallback>,
    task: Option<JoinHandle<()>>,
    /// Bumped on every arm/disarm; a waking task whose generation no longer
    /// matches was superseded and must not fire.
    generation: u64,
}

impl AutoLockTimer {
    /// Create an idle timer with a stored default timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState {
                timeout,
                deadline: None,
                callback: None,
                task: None,
                generation: 0,
            })),
        }
    }

    /// Arm the timer: `on_fire` runs once, `timeout` from now.
    ///
    /// Replaces any previous schedule and callback. A zero timeout leaves
    /// the timer idle.
    pub fn start<F>(&self, timeout: Duration, on_fire: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut state = self.lock();
        state.timeout = timeout;
        state.callback = Some(Arc::new(on_fire));
        Self::arm(&self.state, &mut state);
    }

    /// Push the deadline out by the full timeout (user activity).
    ///
    /// No-op unless the timer is running.
    pub fn reset(&self) {
        let mut state = self.lock();
        if state.deadline.is_some() {
            Self::arm(&self.state, &mut state);
        }
    }

    /// Cancel without firing. The callback is not invoked.
    pub fn stop(&self) {
        let mut state = self.lock();
        Self::disarm(&mut state);
    }

    /// Store a new timeout. A running timer is re-armed with it in place;
    /// an idle timer just remembers it for the next `start`-free arm.
    pub fn set_timeout(&self, timeout: Duration) {
        let mut state = self.lock();
        state.timeout = timeout;
        if state.deadline.is_some() {
            Self::arm(&self.state, &mut state);
        }
    }

    /// Best-effort time left before the lock fires; zero when idle.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        let state = self.lock();
        state
            .deadline
            .map_or(Duration::ZERO, |deadline| {
                deadline.saturating_duration_since(Instant::now())
            })
    }

    /// Returns `true` while a fire is scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock().deadline.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn arm(shared: &Arc<Mutex<TimerState>>, state: &mut TimerState) {
        Self::disarm(state);

        if state.timeout.is_zero() {
            return;
        }
        // A timeout too large to represent effectively never fires.
        let Some(deadline) = Instant::now().checked_add(state.timeout) else {
            return;
        };

        state.deadline = Some(deadline);
        let generation = state.generation;
        let shared = Arc::clone(shared);
        state.task = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            Self::fire(&shared, generation);
        }));
    }

    fn disarm(state: &mut TimerState) {
        if let Some(task) = state.task.take() {
            task.abort();
        }
        state.deadline = None;
        state.generation = state.generation.wrapping_add(1);
    }

    fn fire(shared: &Arc<Mutex<TimerState>>, generation: u64) {
        let callback = {
            let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if state.generation != generation || state.deadline.is_none() {
                // Superseded by a later arm or stop.
                return;
            }
            state.deadline = None;
            state.task = None;
            state.callback.clone()
        };

        tracing::debug!("auto-lock timer fired");
        if let Some(callback) = callback {
            callback();
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
