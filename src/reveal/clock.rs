//! Deferred execution behind a capability trait.
//!
//! The reveal scheduler never touches a timer directly; it asks a [`Clock`]
//! to run an action after a delay. Production uses [`TokioClock`]; tests use
//! [`ManualClock`] and drive virtual time synchronously.

use std::sync::Mutex;
use std::time::Duration;

/// A one-shot deferred action.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Capability to run an action once, after a fixed delay.
///
/// Implementations must never run the action before the delay has elapsed.
/// There is no cancellation: every scheduled action eventually fires unless
/// the host is torn down first.
pub trait Clock: Send + Sync {
    fn schedule(&self, delay: Duration, action: Action);
}

/// Real clock: each action sleeps on its own spawned tokio task.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn schedule(&self, delay: Duration, action: Action) {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        });
    }
}

struct PendingAction {
    due: Duration,
    delay: Duration,
    seq: u64,
    action: Action,
}

struct ManualClockInner {
    now: Duration,
    seq: u64,
    pending: Vec<PendingAction>,
}

/// Virtual-time clock for tests.
///
/// Actions accumulate until [`advance`](ManualClock::advance) moves time
/// forward; due actions then run synchronously on the caller's thread,
/// ordered by (deadline, registration order). An action that schedules
/// further actions within the advanced window gets them run in the same call.
#[derive(Default)]
pub struct ManualClock {
    inner: Mutex<ManualClockInner>,
}

impl Default for ManualClockInner {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            seq: 0,
            pending: Vec::new(),
        }
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of actions scheduled but not yet fired.
    pub fn pending(&self) -> usize {
        self.inner.lock().expect("clock lock poisoned").pending.len()
    }

    /// Delays of the pending actions, in registration order.
    pub fn pending_delays(&self) -> Vec<Duration> {
        let mut guard = self.inner.lock().expect("clock lock poisoned");
        guard.pending.sort_by_key(|p| p.seq);
        guard.pending.iter().map(|p| p.delay).collect()
    }

    /// Move virtual time forward by `by`, firing every action that comes due.
    pub fn advance(&self, by: Duration) {
        let target = self.inner.lock().expect("clock lock poisoned").now + by;
        loop {
            // Pop the earliest due action, if any, without holding the lock
            // while it runs.
            let next = {
                let mut guard = self.inner.lock().expect("clock lock poisoned");
                let next_idx = guard
                    .pending
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.due <= target)
                    .min_by_key(|(_, p)| (p.due, p.seq))
                    .map(|(idx, _)| idx);
                match next_idx {
                    Some(idx) => {
                        let pending = guard.pending.swap_remove(idx);
                        guard.now = pending.due;
                        Some(pending.action)
                    }
                    None => {
                        guard.now = target;
                        None
                    }
                }
            };
            match next {
                Some(action) => action(),
                None => break,
            }
        }
    }

    /// Advance far enough for every currently pending action to fire.
    pub fn run_pending(&self) {
        let remaining = {
            let guard = self.inner.lock().expect("clock lock poisoned");
            guard
                .pending
                .iter()
                .map(|p| p.due)
                .max()
                .map(|due| due.saturating_sub(guard.now))
        };
        if let Some(remaining) = remaining {
            self.advance(remaining);
        }
    }
}

impl Clock for ManualClock {
    fn schedule(&self, delay: Duration, action: Action) {
        let mut guard = self.inner.lock().expect("clock lock poisoned");
        let due = guard.now + delay;
        let seq = guard.seq;
        guard.seq += 1;
        guard.pending.push(PendingAction {
            due,
            delay,
            seq,
            action,
        });
    }
}
