//! Game-balance rules applied to the state document.
//!
//! Every function here is a pure transition over a [`GameState`] (or a pure
//! derivation from config values). Persistence, focus-mode gating and
//! broadcasting belong to [`crate::engine::GameEngine`].
//!
//! - A credited tab close adds XP, may advance the level by one step and
//!   restores a little health
//! - The tab count derives water cleanliness and mood
//! - The periodic health check applies neglect and corruption damage,
//!   detects death and refreshes the night flag
//! - Reviving a dead pet restores partial health
//!
//! All stat arithmetic is saturating and every clamp happens here, at the
//! point of mutation.

use chrono::{DateTime, Duration, Utc};
use goblin_types::{GameState, Level, Mood};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::config::{EnvironmentConfig, GameConfig, TabThresholds, XpConfig};

/// What a credited tab close changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabCloseOutcome {
    /// XP credited (0 when fully diminished).
    pub xp_gain: u32,
    /// The new level if this close evolved the pet.
    pub level_up: Option<Level>,
}

/// What a health check changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HealthCheckOutcome {
    /// Damage applied for inactivity.
    pub neglect_damage: u32,
    /// Damage applied for an excessive tab count.
    pub corruption_damage: u32,
    /// Whether the pet is dead after this check.
    pub dead: bool,
}

// ---------------------------------------------------------------------------
// Diminishing returns
// ---------------------------------------------------------------------------

/// Rolling count of closes inside the current diminishing-returns window.
///
/// The window restarts once `reset_period_minutes` have passed since it
/// last started. The count lives with the engine instance and is not
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiminishingWindow {
    closes: u32,
    started_at: DateTime<Utc>,
}

impl DiminishingWindow {
    /// Start an empty window at `now`.
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            closes: 0,
            started_at: now,
        }
    }

    /// Count one close at `now` and return the number of closes in the
    /// window including this one.
    pub fn record(&mut self, now: DateTime<Utc>, reset_period_minutes: u32) -> u32 {
        let elapsed = now.signed_duration_since(self.started_at);
        if elapsed >= Duration::minutes(i64::from(reset_period_minutes)) {
            self.closes = 0;
            self.started_at = now;
        }
        self.closes = self.closes.saturating_add(1);
        self.closes
    }

    /// Closes counted in the current window.
    pub const fn closes(&self) -> u32 {
        self.closes
    }
}

/// XP for a close that is the `closes_in_window`-th in its window.
///
/// Full `base_per_tab` up to `start_after_tabs` closes, then
/// `floor(base_per_tab * multiplier)`.
pub fn xp_gain(config: &GameConfig, closes_in_window: u32) -> u32 {
    let base = config.xp.base_per_tab;
    let returns = &config.diminishing_returns;
    if closes_in_window <= returns.start_after_tabs {
        return base;
    }
    Decimal::from(base)
        .checked_mul(returns.multiplier)
        .and_then(|scaled| scaled.floor().to_u32())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Leveling
// ---------------------------------------------------------------------------

/// XP needed at `level` to reach the next one, or `None` at the final level.
pub const fn next_level_threshold(level: Level, xp: &XpConfig) -> Option<u32> {
    match level {
        Level::Baby => Some(xp.level2_threshold),
        Level::Teen => Some(xp.level3_threshold),
        Level::Monster => None,
    }
}

/// The level after accumulating `current_xp` at `level`.
///
/// Advances at most one step per call.
pub fn level_after(level: Level, current_xp: u32, xp: &XpConfig) -> Level {
    match (next_level_threshold(level, xp), level.next()) {
        (Some(threshold), Some(next)) if current_xp >= threshold => next,
        _ => level,
    }
}

/// Credit a tab close worth `xp_gain` at `now`.
///
/// A zero gain changes nothing but `lastActiveTime`. Otherwise XP and the
/// lifetime counters grow, the level may advance one step (resetting XP to
/// 0), and health gets the per-close boost clamped to the maximum.
pub fn apply_tab_closed(
    state: &mut GameState,
    config: &GameConfig,
    xp_gain: u32,
    now: DateTime<Utc>,
) -> TabCloseOutcome {
    let mut level_up = None;

    if xp_gain > 0 {
        state.pet.xp = state.pet.xp.saturating_add(xp_gain);
        state.stats.total_xp = state.stats.total_xp.saturating_add(u64::from(xp_gain));
        state.stats.tabs_closed = state.stats.tabs_closed.saturating_add(1);

        let new_level = level_after(state.pet.level, state.pet.xp, &config.xp);
        if new_level > state.pet.level {
            state.pet.level = new_level;
            state.pet.xp = 0;
            level_up = Some(new_level);
        }

        state.pet.health = state
            .pet
            .health
            .saturating_add(config.health.boost_per_tab_closed)
            .min(config.health.max);
    }

    state.stats.last_active_time = now;

    TabCloseOutcome { xp_gain, level_up }
}

// ---------------------------------------------------------------------------
// Tab count
// ---------------------------------------------------------------------------

/// Display-only water cleanliness for `tab_count`.
pub const fn water_cleanliness(
    tab_count: u32,
    tabs: &TabThresholds,
    env: &EnvironmentConfig,
) -> u32 {
    if tab_count > tabs.danger_max {
        env.critical_water
    } else if tab_count > tabs.warning_max {
        env.danger_water
    } else if tab_count > tabs.safe_max {
        env.warning_water
    } else {
        env.clean_water
    }
}

/// The one place mood is derived.
///
/// A pet with no health is dead whatever the tab count says; otherwise the
/// tab-count breakpoints decide.
pub const fn derive_mood(tab_count: u32, health: u32, tabs: &TabThresholds) -> Mood {
    if health == 0 {
        Mood::Dead
    } else if tab_count > tabs.danger_max {
        Mood::Corrupt
    } else if tab_count > tabs.safe_max {
        Mood::Greedy
    } else {
        Mood::Happy
    }
}

/// Record a new tab count and derive cleanliness and mood from it.
pub fn apply_tab_count(state: &mut GameState, config: &GameConfig, tab_count: u32) {
    state.environment.tab_count = tab_count;
    state.environment.water_cleanliness =
        water_cleanliness(tab_count, &config.tabs, &config.environment)
            .min(goblin_types::STAT_MAX);
    state.pet.mood = derive_mood(tab_count, state.pet.health, &config.tabs);
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Whether `hour` falls in the night window.
///
/// A window whose start is after its end wraps past midnight (22 to 6 means
/// `hour >= 22 || hour < 6`). Equal bounds mean no night at all.
pub const fn is_night(hour: u32, env: &EnvironmentConfig) -> bool {
    let (start, end) = (env.night_start_hour, env.night_end_hour);
    if start > end {
        hour >= start || hour < end
    } else {
        hour >= start && hour < end
    }
}

/// Apply one periodic health check at `now`.
pub fn apply_health_check(
    state: &mut GameState,
    config: &GameConfig,
    now: DateTime<Utc>,
    local_hour: u32,
) -> HealthCheckOutcome {
    let mut outcome = HealthCheckOutcome::default();
    let health = &config.health;

    let idle = now.signed_duration_since(state.stats.last_active_time);
    if idle > Duration::hours(i64::from(health.neglect_threshold_hours)) {
        let before = state.pet.health;
        state.pet.health = before.saturating_sub(health.neglect_damage_per_check);
        outcome.neglect_damage = before.saturating_sub(state.pet.health);
    }

    if state.environment.tab_count > config.tabs.danger_max {
        let before = state.pet.health;
        state.pet.health = before.saturating_sub(health.corruption_damage_per_check);
        outcome.corruption_damage = before.saturating_sub(state.pet.health);
    }

    state.pet.health = state.pet.health.min(health.max);
    if state.pet.health == 0 {
        state.pet.mood = Mood::Dead;
    }
    outcome.dead = state.pet.mood.is_dead();

    state.environment.is_night = is_night(local_hour, &config.environment);

    outcome
}

// ---------------------------------------------------------------------------
// Revive
// ---------------------------------------------------------------------------

/// Revive a dead pet at `now`. Returns `false` (and changes nothing) if the
/// pet is alive. Level and XP are kept.
pub fn apply_revive(state: &mut GameState, config: &GameConfig, now: DateTime<Utc>) -> bool {
    if !state.pet.mood.is_dead() {
        return false;
    }
    state.pet.health = config.health.revive_health.min(config.health.max);
    state.pet.mood = Mood::Happy;
    state.stats.last_active_time = now;
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn fresh() -> GameState {
        GameState::fresh(t0())
    }

    #[test]
    fn full_xp_until_window_threshold() {
        let config = GameConfig::default();
        assert_eq!(xp_gain(&config, 1), 5);
        assert_eq!(xp_gain(&config, 10), 5);
    }

    #[test]
    fn diminished_xp_is_floored() {
        let mut config = GameConfig::default();
        // 5 * 0.1 = 0.5 -> 0
        assert_eq!(xp_gain(&config, 11), 0);

        config.xp.base_per_tab = 25;
        // 25 * 0.1 = 2.5 -> 2
        assert_eq!(xp_gain(&config, 11), 2);

        config.diminishing_returns.multiplier = Decimal::new(5, 1);
        assert_eq!(xp_gain(&config, 40), 12);
    }

    #[test]
    fn window_counts_and_resets_after_period() {
        let mut window = DiminishingWindow::new(t0());
        assert_eq!(window.record(t0(), 60), 1);
        assert_eq!(window.record(t0() + Duration::minutes(59), 60), 2);
        assert_eq!(window.record(t0() + Duration::minutes(60), 60), 1);
        assert_eq!(window.closes(), 1);
    }

    #[test]
    fn close_from_defaults() {
        let config = GameConfig::default();
        let mut state = fresh();
        let later = t0() + Duration::minutes(5);

        let outcome = apply_tab_closed(&mut state, &config, 5, later);

        assert_eq!(outcome, TabCloseOutcome { xp_gain: 5, level_up: None });
        assert_eq!(state.pet.xp, 5);
        assert_eq!(state.stats.total_xp, 5);
        assert_eq!(state.stats.tabs_closed, 1);
        assert_eq!(state.pet.health, 100);
        assert_eq!(state.stats.last_active_time, later);
    }

    #[test]
    fn level_up_resets_xp_to_zero() {
        let config = GameConfig::default();
        let mut state = fresh();
        state.pet.xp = 98;

        let outcome = apply_tab_closed(&mut state, &config, 5, t0());

        assert_eq!(outcome.level_up, Some(Level::Teen));
        assert_eq!(state.pet.level, Level::Teen);
        assert_eq!(state.pet.xp, 0);
        assert_eq!(state.stats.total_xp, 5);
    }

    #[test]
    fn level_is_capped_at_max() {
        let config = GameConfig::default();
        let mut state = fresh();
        state.pet.level = Level::Monster;
        state.pet.xp = 10_000;

        let outcome = apply_tab_closed(&mut state, &config, 5, t0());

        assert_eq!(outcome.level_up, None);
        assert_eq!(state.pet.level, Level::Monster);
        assert_eq!(state.pet.xp, 10_005);
    }

    #[test]
    fn level_advances_one_step_per_close() {
        let config = GameConfig::default();
        let mut state = fresh();
        // Enough XP for both thresholds at once still only moves one level.
        state.pet.xp = 1_000;
        apply_tab_closed(&mut state, &config, 5, t0());
        assert_eq!(state.pet.level, Level::Teen);
        assert_eq!(state.pet.xp, 0);
    }

    #[test]
    fn zero_gain_only_refreshes_activity() {
        let config = GameConfig::default();
        let mut state = fresh();
        state.pet.health = 60;
        let later = t0() + Duration::hours(2);

        let outcome = apply_tab_closed(&mut state, &config, 0, later);

        assert_eq!(outcome.xp_gain, 0);
        assert_eq!(state.pet.xp, 0);
        assert_eq!(state.stats.tabs_closed, 0);
        assert_eq!(state.pet.health, 60);
        assert_eq!(state.stats.last_active_time, later);
    }

    #[test]
    fn health_boost_is_clamped() {
        let config = GameConfig::default();
        let mut state = fresh();
        state.pet.health = 99;
        apply_tab_closed(&mut state, &config, 5, t0());
        assert_eq!(state.pet.health, 100);
    }

    #[test]
    fn tab_count_breakpoints() {
        let config = GameConfig::default();
        let cases = [
            (0, 100, Mood::Happy),
            (10, 100, Mood::Happy),
            (11, 70, Mood::Greedy),
            (25, 70, Mood::Greedy),
            (26, 40, Mood::Greedy),
            (50, 40, Mood::Greedy),
            (51, 10, Mood::Corrupt),
            (60, 10, Mood::Corrupt),
        ];
        for (count, water, mood) in cases {
            let mut state = fresh();
            apply_tab_count(&mut state, &config, count);
            assert_eq!(state.environment.tab_count, count);
            assert_eq!(state.environment.water_cleanliness, water, "count {count}");
            assert_eq!(state.pet.mood, mood, "count {count}");
        }
    }

    #[test]
    fn tab_count_never_revives_the_dead() {
        let config = GameConfig::default();
        let mut state = fresh();
        state.pet.health = 0;
        state.pet.mood = Mood::Dead;

        apply_tab_count(&mut state, &config, 2);

        assert_eq!(state.pet.mood, Mood::Dead);
        assert_eq!(state.environment.water_cleanliness, 100);
    }

    #[test]
    fn night_window_wraps_midnight() {
        let env = EnvironmentConfig::default();
        assert!(is_night(22, &env));
        assert!(is_night(23, &env));
        assert!(is_night(0, &env));
        assert!(is_night(5, &env));
        assert!(!is_night(6, &env));
        assert!(!is_night(21, &env));
    }

    #[test]
    fn night_window_without_wrap() {
        let env = EnvironmentConfig {
            night_start_hour: 1,
            night_end_hour: 4,
            ..EnvironmentConfig::default()
        };
        assert!(is_night(1, &env));
        assert!(is_night(3, &env));
        assert!(!is_night(4, &env));
        assert!(!is_night(0, &env));
    }

    #[test]
    fn neglect_applies_only_past_threshold() {
        let config = GameConfig::default();
        let mut state = fresh();

        let outcome = apply_health_check(&mut state, &config, t0() + Duration::hours(24), 12);
        assert_eq!(outcome.neglect_damage, 0);
        assert_eq!(state.pet.health, 100);

        let outcome = apply_health_check(
            &mut state,
            &config,
            t0() + Duration::hours(24) + Duration::minutes(1),
            12,
        );
        assert_eq!(outcome.neglect_damage, 20);
        assert_eq!(state.pet.health, 80);
    }

    #[test]
    fn corruption_damage_above_danger() {
        let config = GameConfig::default();
        let mut state = fresh();
        state.environment.tab_count = 51;

        let outcome = apply_health_check(&mut state, &config, t0(), 12);

        assert_eq!(outcome.corruption_damage, 1);
        assert_eq!(state.pet.health, 99);
        assert!(!outcome.dead);
    }

    #[test]
    fn damage_saturates_and_kills() {
        let config = GameConfig::default();
        let mut state = fresh();
        state.pet.health = 5;
        state.environment.tab_count = 80;

        let outcome = apply_health_check(&mut state, &config, t0() + Duration::days(3), 23);

        assert_eq!(outcome.neglect_damage, 5);
        assert_eq!(outcome.corruption_damage, 0);
        assert!(outcome.dead);
        assert_eq!(state.pet.health, 0);
        assert_eq!(state.pet.mood, Mood::Dead);
        assert!(state.environment.is_night);
    }

    #[test]
    fn revive_only_when_dead() {
        let config = GameConfig::default();
        let mut state = fresh();
        state.pet.health = 30;
        assert!(!apply_revive(&mut state, &config, t0()));
        assert_eq!(state.pet.health, 30);

        state.pet.health = 0;
        state.pet.mood = Mood::Dead;
        state.pet.level = Level::Teen;
        state.pet.xp = 17;
        let later = t0() + Duration::hours(30);
        assert!(apply_revive(&mut state, &config, later));
        assert_eq!(state.pet.health, 50);
        assert_eq!(state.pet.mood, Mood::Happy);
        assert_eq!(state.pet.level, Level::Teen);
        assert_eq!(state.pet.xp, 17);
        assert_eq!(state.stats.last_active_time, later);
    }
}
