//! Browser tab activity to engine operations.
//!
//! [`TabMonitor`] receives raw tab lifecycle events. A removal credits the
//! pet immediately, then every event (removal included) feeds the
//! debouncer. When the debounced timer fires the monitor asks a
//! [`TabQuery`] for the real count and hands it to the engine.

use goblin_types::TabEvent;
use tracing::{debug, warn};

use crate::debounce::{Debouncer, Scheduler, TimerId};
use crate::engine::GameEngine;

/// Errors that can occur when counting open tabs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TabQueryError {
    /// The browser has not reported a count yet.
    #[error("tab count unavailable: {reason}")]
    Unavailable {
        /// Why the count could not be obtained.
        reason: String,
    },
}

/// Asks the browser how many tabs are open.
pub trait TabQuery {
    /// Current number of open tabs.
    ///
    /// # Errors
    ///
    /// Returns [`TabQueryError`] if the count cannot be determined.
    fn tab_count(&mut self) -> Result<u32, TabQueryError>;
}

/// The count most recently reported alongside a tab event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportedTabs {
    last: Option<u32>,
}

impl ReportedTabs {
    /// Nothing reported yet.
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Remember `count` as the latest figure.
    pub const fn report(&mut self, count: u32) {
        self.last = Some(count);
    }
}

impl TabQuery for ReportedTabs {
    fn tab_count(&mut self) -> Result<u32, TabQueryError> {
        self.last.ok_or_else(|| TabQueryError::Unavailable {
            reason: "no tab event received yet".to_owned(),
        })
    }
}

/// Routes tab events to the engine through the debouncer.
#[derive(Debug)]
pub struct TabMonitor<S> {
    debouncer: Debouncer<S>,
}

impl<S: Scheduler> TabMonitor<S> {
    /// Wrap a debouncer.
    pub const fn new(debouncer: Debouncer<S>) -> Self {
        Self { debouncer }
    }

    /// Handle one tab lifecycle event.
    ///
    /// A [`TabEvent::TabRemoved`] is credited before the debounce timer is
    /// (re)started, so the XP lands even if more events follow.
    pub fn on_event(&mut self, engine: &mut GameEngine, event: TabEvent) -> TimerId {
        if event == TabEvent::TabRemoved {
            engine.on_tab_closed();
        }
        self.debouncer.signal()
    }

    /// Handle a fired timer.
    ///
    /// Returns `true` if `id` was the pending timer and a count update ran.
    pub fn on_timer(
        &mut self,
        engine: &mut GameEngine,
        id: TimerId,
        query: &mut dyn TabQuery,
    ) -> bool {
        if !self.debouncer.fire(id) {
            debug!(timer = id.get(), "Stale debounce timer ignored");
            return false;
        }
        match query.tab_count() {
            Ok(count) => engine.update_tab_count(count),
            Err(e) => warn!(error = %e, "Skipping tab count update"),
        }
        true
    }

    /// Borrow the debouncer.
    pub const fn debouncer(&self) -> &Debouncer<S> {
        &self.debouncer
    }

    /// Mutably borrow the debouncer.
    pub const fn debouncer_mut(&mut self) -> &mut Debouncer<S> {
        &mut self.debouncer
    }
}
