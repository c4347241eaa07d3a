//! Debounce timers backed by tokio tasks.
//!
//! Each timer is a spawned task that sleeps and then posts
//! [`HostEvent::TimerFired`] into the host's event queue. Cancelling a timer
//! aborts its task, so a cancelled timer never reaches the event loop
//! (a firing that races the abort is filtered out by the debouncer's stale
//! id check).

use std::collections::BTreeMap;
use std::time::Duration;

use goblin_core::{Scheduler, TimerId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::host::HostEvent;

/// [`Scheduler`] that fires into the host event queue.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct TokioScheduler {
    events: mpsc::UnboundedSender<HostEvent>,
    next_id: u64,
    timers: BTreeMap<TimerId, JoinHandle<()>>,
}

impl TokioScheduler {
    /// Create a scheduler that posts firings to `events`.
    pub const fn new(events: mpsc::UnboundedSender<HostEvent>) -> Self {
        Self {
            events,
            next_id: 0,
            timers: BTreeMap::new(),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn set_timer(&mut self, delay: Duration) -> TimerId {
        self.timers.retain(|_, task| !task.is_finished());

        let id = TimerId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        let events = self.events.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if events.send(HostEvent::TimerFired(id)).is_err() {
                debug!(timer = id.get(), "Host gone before timer fired");
            }
        });
        self.timers.insert(id, task);
        id
    }

    fn cancel_timer(&mut self, id: TimerId) {
        if let Some(task) = self.timers.remove(&id) {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for task in self.timers.values() {
            task.abort();
        }
    }
}
