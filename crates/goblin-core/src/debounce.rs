//! Trailing-edge debouncing of tab lifecycle signals.
//!
//! A burst of tab create/update/remove events becomes one tab-count update
//! once the browser has been quiet for the debounce window. Each signal
//! cancels the pending timer and schedules a new one; only the most recent
//! timer is honoured when it fires.
//!
//! Timers come from a [`Scheduler`] so the host can back them with tokio
//! tasks while tests drive them with [`ManualScheduler`].

use std::collections::BTreeMap;
use std::time::Duration;

/// Identifier of a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Wrap a raw id allocated by a [`Scheduler`].
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Something that can fire a timer after a delay.
///
/// Firing is reported back to the owner of the [`Debouncer`] out of band
/// (the host delivers it through its event loop), which then calls
/// [`Debouncer::fire`] with the id.
pub trait Scheduler: Send {
    /// Schedule a one-shot timer and return its id. Ids are never reused.
    fn set_timer(&mut self, delay: Duration) -> TimerId;

    /// Cancel a timer. Cancelling an unknown or already-fired id is a no-op.
    fn cancel_timer(&mut self, id: TimerId);
}

/// Trailing-edge debouncer over a [`Scheduler`].
#[derive(Debug)]
pub struct Debouncer<S> {
    scheduler: S,
    window: Duration,
    pending: Option<TimerId>,
}

impl<S: Scheduler> Debouncer<S> {
    /// Create a debouncer that waits `window` after the last signal.
    pub const fn new(scheduler: S, window: Duration) -> Self {
        Self {
            scheduler,
            window,
            pending: None,
        }
    }

    /// Record a signal: cancel any pending timer and start a fresh one.
    pub fn signal(&mut self) -> TimerId {
        if let Some(previous) = self.pending.take() {
            self.scheduler.cancel_timer(previous);
        }
        let id = self.scheduler.set_timer(self.window);
        self.pending = Some(id);
        id
    }

    /// Report that timer `id` fired.
    ///
    /// Returns `true` if it was the pending timer and the debounced action
    /// should run now. Stale ids return `false`.
    pub fn fire(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Cancel the pending timer, if any.
    pub fn cancel(&mut self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel_timer(id);
        }
    }

    /// Whether a timer is pending.
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The quiet period.
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Borrow the scheduler.
    pub const fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Mutably borrow the scheduler.
    pub const fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

/// Virtual-time scheduler. Nothing fires until [`advance`](Self::advance)
/// moves time past a deadline.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    deadlines: BTreeMap<TimerId, Duration>,
}

impl ManualScheduler {
    /// Create a scheduler at virtual time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move virtual time forward by `by` and return the timers that fired,
    /// earliest deadline first.
    pub fn advance(&mut self, by: Duration) -> Vec<TimerId> {
        self.now = self.now.saturating_add(by);
        let now = self.now;

        let mut due: Vec<(Duration, TimerId)> = self
            .deadlines
            .iter()
            .filter(|&(_, &deadline)| deadline <= now)
            .map(|(&id, &deadline)| (deadline, id))
            .collect();
        due.sort();

        for (_, id) in &due {
            self.deadlines.remove(id);
        }
        due.into_iter().map(|(_, id)| id).collect()
    }

    /// Timers scheduled and not yet fired or cancelled.
    pub fn pending_count(&self) -> usize {
        self.deadlines.len()
    }

    /// Current virtual time.
    pub const fn elapsed(&self) -> Duration {
        self.now
    }
}

impl Scheduler for ManualScheduler {
    fn set_timer(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.deadlines.insert(id, self.now.saturating_add(delay));
        id
    }

    fn cancel_timer(&mut self, id: TimerId) {
        self.deadlines.remove(&id);
    }
}
