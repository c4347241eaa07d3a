//! The game engine: the only writer of the state document.
//!
//! Each operation reads the document through the [`StateStore`], applies a
//! rule from [`crate::rules`], writes the whole document back and pushes
//! any resulting notifications through the [`MessageBus`].
//!
//! While focus mode is active the tab-close credit and the health check do
//! nothing, and a tab-count update only refreshes the displayed count.
//!
//! Persistence failures are already logged by the store and never abort an
//! operation: the cache holds the new document either way. Notification
//! failures (typically "nobody is listening") are dropped at debug level.

use goblin_store::{StateStore, StoreError, SubscriptionId};
use goblin_types::{ConsoleVariant, GameState, LcdPalette, Notification, PetName, StatsSummary};
use tracing::{debug, info, warn};

use crate::bus::MessageBus;
use crate::clock::Clock;
use crate::config::GameConfig;
use crate::rules::{self, DiminishingWindow, HealthCheckOutcome, TabCloseOutcome};

/// Owns the store, the notification bus and the clock, and applies the game
/// rules to the document.
pub struct GameEngine {
    store: StateStore,
    bus: Box<dyn MessageBus>,
    clock: Box<dyn Clock>,
    config: GameConfig,
    window: DiminishingWindow,
}

impl GameEngine {
    /// Assemble an engine from its collaborators.
    pub fn new(
        store: StateStore,
        bus: Box<dyn MessageBus>,
        clock: Box<dyn Clock>,
        config: GameConfig,
    ) -> Self {
        let window = DiminishingWindow::new(clock.now());
        Self {
            store,
            bus,
            clock,
            config,
            window,
        }
    }

    /// The active configuration.
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Register a listener called with the document after every write.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&GameState) + Send + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Direct access to the store (cache control, unsubscribe).
    pub const fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    /// The current document.
    pub fn state(&mut self) -> GameState {
        self.store.get_state()
    }

    /// Closes counted in the current diminishing-returns window.
    pub const fn closes_in_window(&self) -> u32 {
        self.window.closes()
    }

    /// Write a fresh default document if nothing is persisted yet.
    ///
    /// Returns `true` if a document was written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be read or written.
    pub fn ensure_initialized(&mut self) -> Result<bool, StoreError> {
        if self.store.has_persisted()? {
            return Ok(false);
        }
        info!("No saved goblin found, hatching a new one");
        self.store.set_state(GameState::fresh(self.clock.now()))?;
        Ok(true)
    }

    // -----------------------------------------------------------------
    // Game mechanics
    // -----------------------------------------------------------------

    /// Credit the pet for one closed tab.
    ///
    /// Returns `None` when focus mode suppressed the close.
    pub fn on_tab_closed(&mut self) -> Option<TabCloseOutcome> {
        let mut state = self.store.get_state();
        if state.is_paused() {
            debug!("Focus mode active, tab close not credited");
            return None;
        }

        let now = self.clock.now();
        let closes = self
            .window
            .record(now, self.config.diminishing_returns.reset_period_minutes);
        let gain = rules::xp_gain(&self.config, closes);
        let outcome = rules::apply_tab_closed(&mut state, &self.config, gain, now);

        debug!(
            xp_gain = outcome.xp_gain,
            closes_in_window = closes,
            xp = state.pet.xp,
            health = state.pet.health,
            "Tab close credited"
        );
        self.persist(state);

        self.broadcast(&Notification::TabClosed {
            xp_gain: outcome.xp_gain,
        });
        if let Some(level) = outcome.level_up {
            info!(level = %level, "Goblin evolved");
            self.broadcast(&Notification::LevelUp { level });
        }

        Some(outcome)
    }

    /// Record the current number of open tabs.
    pub fn update_tab_count(&mut self, tab_count: u32) {
        let mut state = self.store.get_state();
        if state.is_paused() {
            state.environment.tab_count = tab_count;
        } else {
            rules::apply_tab_count(&mut state, &self.config, tab_count);
        }
        debug!(
            tab_count,
            mood = %state.pet.mood,
            water = state.environment.water_cleanliness,
            "Tab count updated"
        );
        self.persist(state);
    }

    /// Run one periodic health check.
    ///
    /// Returns `None` when focus mode suppressed the check.
    pub fn perform_health_check(&mut self) -> Option<HealthCheckOutcome> {
        let mut state = self.store.get_state();
        if state.is_paused() {
            return None;
        }

        let was_dead = state.pet.mood.is_dead();
        let outcome = rules::apply_health_check(
            &mut state,
            &self.config,
            self.clock.now(),
            self.clock.local_hour(),
        );

        if outcome.neglect_damage > 0 || outcome.corruption_damage > 0 {
            debug!(
                neglect = outcome.neglect_damage,
                corruption = outcome.corruption_damage,
                health = state.pet.health,
                "Health check applied damage"
            );
        }
        if outcome.dead && !was_dead {
            warn!(name = %state.pet.name, "Goblin died");
        }

        self.persist(state);
        Some(outcome)
    }

    /// Bring a dead pet back. Returns whether a revive happened.
    pub fn revive_goblin(&mut self) -> bool {
        let mut state = self.store.get_state();
        if !rules::apply_revive(&mut state, &self.config, self.clock.now()) {
            debug!("Revive ignored, goblin is alive");
            return false;
        }
        info!(health = state.pet.health, "Goblin revived");
        self.persist(state);
        true
    }

    /// Flip focus mode and return the new value.
    pub fn toggle_focus_mode(&mut self) -> bool {
        let mut state = self.store.get_state();
        state.settings.focus_mode_active = !state.settings.focus_mode_active;
        let active = state.settings.focus_mode_active;
        info!(active, "Focus mode toggled");
        self.persist(state);
        active
    }

    // -----------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------

    /// Rename the pet.
    pub fn rename_pet(&mut self, name: PetName) {
        self.modify(|state| state.pet.name = name);
    }

    /// Enable or disable UI sounds.
    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.modify(|state| state.settings.sound_enabled = enabled);
    }

    /// Choose the console shell.
    pub fn set_console_variant(&mut self, variant: ConsoleVariant) {
        self.modify(|state| state.settings.console_variant = variant);
    }

    /// Choose the LCD palette.
    pub fn set_lcd_palette(&mut self, palette: LcdPalette) {
        self.modify(|state| state.settings.lcd_palette = palette);
    }

    /// Mark the tutorial as seen.
    pub fn complete_tutorial(&mut self) {
        self.modify(|state| state.settings.is_first_run = false);
    }

    /// Erase all progress. The new document is stamped with the current
    /// time and the diminishing-returns window starts over.
    pub fn reset_game(&mut self) {
        let now = self.clock.now();
        self.window = DiminishingWindow::new(now);
        info!("Game reset");
        if let Err(e) = self.store.reset(GameState::fresh(now)) {
            debug!(error = %e, "Reset not persisted");
        }
    }

    /// Derived statistics for the stats screen.
    pub fn stats_summary(&mut self) -> StatsSummary {
        let state = self.store.get_state();
        let played = self
            .clock
            .now()
            .signed_duration_since(state.stats.first_play_time)
            .num_minutes();

        StatsSummary {
            name: state.pet.name.to_string(),
            level: state.pet.level,
            health: state.pet.health,
            mood: state.pet.mood,
            xp: state.pet.xp,
            xp_for_next_level: rules::next_level_threshold(state.pet.level, &self.config.xp),
            tabs_closed: state.stats.tabs_closed,
            total_xp: state.stats.total_xp,
            play_time_minutes: u64::try_from(played).unwrap_or(0),
        }
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn modify<F>(&mut self, mutate: F)
    where
        F: FnOnce(&mut GameState),
    {
        if let Err(e) = self.store.update(mutate) {
            debug!(error = %e, "Settings change not persisted");
        }
    }

    fn persist(&mut self, state: GameState) {
        if let Err(e) = self.store.set_state(state) {
            debug!(error = %e, "State change not persisted");
        }
    }

    fn broadcast(&self, notification: &Notification) {
        if let Err(e) = self.bus.send(notification) {
            debug!(error = %e, "Notification not delivered");
        }
    }
}

impl core::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GameEngine")
            .field("store", &self.store)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
