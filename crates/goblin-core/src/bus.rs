//! Notification delivery to the presentation layer.
//!
//! The engine pushes [`Notification`]s through a [`MessageBus`]. Delivery is
//! best-effort: when no UI is listening the send fails with
//! [`BusError::NoListeners`], which the engine swallows.

use std::sync::{Arc, Mutex, PoisonError};

use goblin_types::Notification;

/// Errors that can occur when delivering a notification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// Nobody is listening.
    #[error("no listeners for notification")]
    NoListeners,

    /// The transport is gone.
    #[error("notification channel closed: {message}")]
    Closed {
        /// Description of the failure.
        message: String,
    },
}

/// A sink for engine notifications.
pub trait MessageBus: Send {
    /// Deliver `notification` to every current listener.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if nobody received it.
    fn send(&self, notification: &Notification) -> Result<(), BusError>;
}

/// A bus that drops everything. Every send reports
/// [`BusError::NoListeners`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBus;

impl MessageBus for NullBus {
    fn send(&self, _notification: &Notification) -> Result<(), BusError> {
        Err(BusError::NoListeners)
    }
}

type LocalListener = Box<dyn Fn(&Notification) + Send>;

/// In-process bus with synchronous listeners. Clones share listeners.
#[derive(Clone, Default)]
pub struct LocalBus {
    listeners: Arc<Mutex<Vec<LocalListener>>>,
}

impl LocalBus {
    /// Create a bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for every subsequent notification.
    pub fn on_message<F>(&self, listener: F)
    where
        F: Fn(&Notification) + Send + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl MessageBus for LocalBus {
    fn send(&self, notification: &Notification) -> Result<(), BusError> {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if listeners.is_empty() {
            return Err(BusError::NoListeners);
        }
        for listener in listeners.iter() {
            listener(notification);
        }
        Ok(())
    }
}

impl core::fmt::Debug for LocalBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LocalBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn null_bus_has_no_listeners() {
        let err = NullBus.send(&Notification::TabClosed { xp_gain: 5 }).unwrap_err();
        assert_eq!(err, BusError::NoListeners);
    }

    #[test]
    fn local_bus_fans_out_to_clones() {
        let bus = LocalBus::new();
        assert!(bus.send(&Notification::TabClosed { xp_gain: 1 }).is_err());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.clone().on_message(move |n| sink.lock().unwrap().push(n.clone()));

        bus.send(&Notification::TabClosed { xp_gain: 5 }).unwrap();

        assert_eq!(bus.listener_count(), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Notification::TabClosed { xp_gain: 5 }]
        );
    }
}
