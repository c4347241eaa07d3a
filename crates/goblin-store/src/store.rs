//! Cached state store with change subscriptions.
//!
//! [`StateStore`] owns the one [`GameState`] document. Reads are served from
//! an explicit cache; a cache miss loads from the [`StateBackend`] and falls
//! back to the default document when nothing usable is persisted. Every
//! write replaces the whole document, refreshes the cache and notifies
//! subscribers synchronously.
//!
//! All mutating methods take `&mut self`. The store has a single owner (the
//! game engine), so read-modify-write cycles cannot interleave.

use std::collections::BTreeMap;

use goblin_types::{GameState, STATE_KEY};
use tracing::{debug, warn};

use crate::backend::StateBackend;
use crate::error::StoreError;

/// Callback invoked with the new document after every write.
pub type Listener = Box<dyn Fn(&GameState) + Send>;

/// Handle returned by [`StateStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// The persistent holder of the game-state document.
pub struct StateStore {
    backend: Box<dyn StateBackend>,
    key: String,
    cache: Option<GameState>,
    listeners: BTreeMap<SubscriptionId, Listener>,
    next_subscription: u64,
}

impl StateStore {
    /// Create a store over `backend` using the standard document key.
    pub fn new(backend: Box<dyn StateBackend>) -> Self {
        Self::with_key(backend, STATE_KEY)
    }

    /// Create a store over `backend` using a custom document key.
    pub fn with_key(backend: Box<dyn StateBackend>, key: &str) -> Self {
        Self {
            backend,
            key: key.to_owned(),
            cache: None,
            listeners: BTreeMap::new(),
            next_subscription: 0,
        }
    }

    /// Return the current document.
    ///
    /// Serves the cache when warm. Otherwise loads from the backend and
    /// caches the result. A missing, unreadable or undecodable document
    /// yields [`GameState::default`], which is *not* cached so the next
    /// read retries the backend.
    pub fn get_state(&mut self) -> GameState {
        if let Some(cached) = &self.cache {
            return cached.clone();
        }

        match self.load() {
            Ok(Some(state)) => {
                self.cache = Some(state.clone());
                state
            }
            Ok(None) => {
                debug!(key = %self.key, "No persisted state, using defaults");
                GameState::default()
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to load state, using defaults");
                GameState::default()
            }
        }
    }

    /// Persist `state` as a whole document, refresh the cache and notify
    /// subscribers.
    ///
    /// The cache and the subscribers see the new document even when the
    /// backend write fails; the failure is logged and returned so the
    /// caller can decide whether it matters.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if encoding or the backend write fails.
    pub fn set_state(&mut self, state: GameState) -> Result<(), StoreError> {
        let result = serde_json::to_string(&state)
            .map_err(StoreError::from)
            .and_then(|document| self.backend.save(&self.key, &document));

        if let Err(e) = &result {
            warn!(key = %self.key, error = %e, "Failed to persist state");
        }

        self.notify(&state);
        self.cache = Some(state);
        result
    }

    /// Apply `mutate` to the current document and write the result.
    ///
    /// Returns the document as written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails. The cache still holds
    /// the mutated document.
    pub fn update<F>(&mut self, mutate: F) -> Result<GameState, StoreError>
    where
        F: FnOnce(&mut GameState),
    {
        let mut state = self.get_state();
        mutate(&mut state);
        self.set_state(state.clone())?;
        Ok(state)
    }

    /// Overwrite the document with `defaults`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    pub fn reset(&mut self, defaults: GameState) -> Result<(), StoreError> {
        debug!(key = %self.key, "Resetting state to defaults");
        self.set_state(defaults)
    }

    /// Whether the backend currently holds a document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be read.
    pub fn has_persisted(&self) -> Result<bool, StoreError> {
        Ok(self.backend.load(&self.key)?.is_some())
    }

    /// Register `listener`, called with the new document after every write.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&GameState) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription = self.next_subscription.saturating_add(1);
        self.listeners.insert(id, Box::new(listener));
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drop the cached document so the next read goes to the backend.
    pub fn clear_cache(&mut self) {
        self.cache = None;
    }

    /// Pre-seed the cache without touching the backend.
    pub fn seed_cache(&mut self, state: GameState) {
        self.cache = Some(state);
    }

    /// The cached document, if warm.
    pub const fn cached(&self) -> Option<&GameState> {
        self.cache.as_ref()
    }

    fn load(&self) -> Result<Option<GameState>, StoreError> {
        self.backend
            .load(&self.key)?
            .map(|document| serde_json::from_str(&document))
            .transpose()
            .map_err(StoreError::from)
    }

    fn notify(&self, state: &GameState) {
        for listener in self.listeners.values() {
            listener(state);
        }
    }
}

impl core::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StateStore")
            .field("key", &self.key)
            .field("cached", &self.cache.is_some())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use goblin_types::Mood;

    use super::*;
    use crate::backend::MemoryBackend;

    fn store_with(backend: &MemoryBackend) -> StateStore {
        StateStore::new(Box::new(backend.clone()))
    }

    #[test]
    fn cache_miss_without_document_returns_default_uncached() {
        let backend = MemoryBackend::new();
        let mut store = store_with(&backend);

        let state = store.get_state();
        assert_eq!(state.pet.health, 100);
        assert!(store.cached().is_none());
    }

    #[test]
    fn set_state_persists_and_caches() {
        let backend = MemoryBackend::new();
        let mut store = store_with(&backend);

        let mut state = store.get_state();
        state.pet.xp = 42;
        store.set_state(state.clone()).unwrap();

        assert_eq!(store.cached(), Some(&state));
        let raw = backend.raw(STATE_KEY).unwrap();
        let persisted: GameState = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, state);
    }

    #[test]
    fn cached_state_survives_backend_outage() {
        let backend = MemoryBackend::new();
        let mut store = store_with(&backend);
        let mut state = store.get_state();
        state.pet.xp = 7;
        store.set_state(state).unwrap();

        backend.set_fail_reads(true);
        assert_eq!(store.get_state().pet.xp, 7);
    }

    #[test]
    fn failed_write_still_updates_cache_and_listeners() {
        let backend = MemoryBackend::new();
        let mut store = store_with(&backend);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |s| sink.lock().unwrap().push(s.pet.xp));

        backend.set_fail_writes(true);
        let mut state = store.get_state();
        state.pet.xp = 9;
        assert!(store.set_state(state).is_err());

        assert_eq!(store.cached().map(|s| s.pet.xp), Some(9));
        assert_eq!(*seen.lock().unwrap(), vec![9]);
        assert!(backend.raw(STATE_KEY).is_none());
    }

    #[test]
    fn undecodable_document_falls_back_to_default() {
        let backend = MemoryBackend::new();
        backend.insert_raw(STATE_KEY, "{not json");
        let mut store = store_with(&backend);

        let state = store.get_state();
        assert_eq!(state.pet.mood, Mood::Happy);
        assert!(store.cached().is_none());
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let backend = MemoryBackend::new();
        let mut store = store_with(&backend);
        let count = Arc::new(Mutex::new(0_u32));
        let sink = Arc::clone(&count);
        let id = store.subscribe(move |_| *sink.lock().unwrap() += 1);

        store.set_state(GameState::default()).unwrap();
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set_state(GameState::default()).unwrap();

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn clear_cache_forces_reload() {
        let backend = MemoryBackend::new();
        let mut store = store_with(&backend);
        let mut seeded = GameState::default();
        seeded.pet.xp = 99;
        store.seed_cache(seeded);
        assert_eq!(store.get_state().pet.xp, 99);
        assert!(backend.raw(STATE_KEY).is_none());

        store.clear_cache();
        assert_eq!(store.get_state().pet.xp, 0);
    }

    #[test]
    fn update_applies_closure_and_writes() {
        let backend = MemoryBackend::new();
        let mut store = store_with(&backend);

        let written = store.update(|s| s.settings.sound_enabled = true).unwrap();
        assert!(written.settings.sound_enabled);
        assert!(store.has_persisted().unwrap());
    }
}
