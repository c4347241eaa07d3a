//! Notification bus over a tokio broadcast channel.
//!
//! The engine sends into a [`ChannelBus`]; the host event loop holds a
//! receiver and forwards every notification to the browser as a frame.

use goblin_core::{BusError, GameEngine, MessageBus};
use goblin_store::SubscriptionId;
use goblin_types::Notification;
use tokio::sync::broadcast;

/// Capacity of the notification channel. The host drains it after every
/// handler, so it only has to hold what one event produces.
pub const NOTIFICATION_CAPACITY: usize = 64;

/// [`MessageBus`] that fans out through a broadcast channel.
#[derive(Debug, Clone)]
pub struct ChannelBus {
    tx: broadcast::Sender<Notification>,
}

impl ChannelBus {
    /// Create a bus with room for `capacity` undelivered notifications.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// A new receiver for notifications sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Push `STATE_CHANGED` with the written document after every store
    /// write the engine makes.
    pub fn forward_state_changes(&self, engine: &mut GameEngine) -> SubscriptionId {
        let tx = self.tx.clone();
        engine.subscribe(move |state| {
            // No receiver means no UI attached yet; nothing to do.
            tx.send(Notification::StateChanged {
                state: state.clone(),
            })
            .ok();
        })
    }
}

impl MessageBus for ChannelBus {
    fn send(&self, notification: &Notification) -> Result<(), BusError> {
        match self.tx.send(notification.clone()) {
            Ok(_) => Ok(()),
            Err(_) => Err(BusError::NoListeners),
        }
    }
}
