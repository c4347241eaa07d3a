//! The persisted game-state document.
//!
//! Exactly one [`GameState`] exists per installation. It is stored as a
//! whole-document JSON value whose keys match the layout the extension UI
//! reads (`camelCase`, `totalXP`, epoch-millisecond timestamps).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ConsoleVariant, LcdPalette, Level, Mood};
use crate::name::PetName;

/// Upper bound for every percentage stat (health, water cleanliness).
pub const STAT_MAX: u32 = 100;

/// Storage key the state document lives under.
pub const STATE_KEY: &str = "tabgoblin_state";

/// The pet itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PetState {
    /// Display name, 1 to 10 characters.
    #[ts(as = "String")]
    pub name: PetName,
    /// Evolution stage.
    #[ts(as = "u8")]
    pub level: Level,
    /// XP accumulated toward the next level. Reset to 0 on level-up.
    pub xp: u32,
    /// Health in `0..=100`.
    pub health: u32,
    /// Current mood.
    pub mood: Mood,
}

/// The pet's surroundings, derived from the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct EnvironmentState {
    /// Number of open tabs last reported.
    pub tab_count: u32,
    /// Display-only water cleanliness in `0..=100`.
    pub water_cleanliness: u32,
    /// Whether the local wall-clock hour is inside the night window.
    pub is_night: bool,
}

/// Lifetime counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GameStats {
    /// Tabs credited as closed.
    pub tabs_closed: u64,
    /// XP earned over the pet's whole life, never reset by level-ups.
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    /// Last qualifying activity (a tab close or a revive).
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub last_active_time: DateTime<Utc>,
    /// When this document was created.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub first_play_time: DateTime<Utc>,
}

/// User preferences and mode switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GameSettings {
    /// Whether the UI plays sounds.
    pub sound_enabled: bool,
    /// Pause switch: while set, no mood, health or XP mutation happens.
    pub focus_mode_active: bool,
    /// Whether the tutorial still needs to be shown.
    pub is_first_run: bool,
    /// Console shell drawn by the UI.
    #[serde(default)]
    pub console_variant: ConsoleVariant,
    /// LCD colour palette used by the UI.
    #[serde(default)]
    pub lcd_palette: LcdPalette,
}

/// The single persisted game-state document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameState {
    /// The pet.
    pub pet: PetState,
    /// Tab-derived surroundings.
    pub environment: EnvironmentState,
    /// Lifetime counters.
    pub stats: GameStats,
    /// Preferences.
    pub settings: GameSettings,
}

impl GameState {
    /// Build the canonical default document with both timestamps set to `now`.
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            pet: PetState {
                name: PetName::default(),
                level: Level::Baby,
                xp: 0,
                health: STAT_MAX,
                mood: Mood::Happy,
            },
            environment: EnvironmentState {
                tab_count: 0,
                water_cleanliness: STAT_MAX,
                is_night: false,
            },
            stats: GameStats {
                tabs_closed: 0,
                total_xp: 0,
                last_active_time: now,
                first_play_time: now,
            },
            settings: GameSettings {
                sound_enabled: false,
                focus_mode_active: false,
                is_first_run: true,
                console_variant: ConsoleVariant::Classic,
                lcd_palette: LcdPalette::Green,
            },
        }
    }

    /// Whether focus mode currently suspends game mechanics.
    pub const fn is_paused(&self) -> bool {
        self.settings.focus_mode_active
    }
}

impl Default for GameState {
    /// Default document stamped with the current wall-clock time.
    fn default() -> Self {
        Self::fresh(Utc::now())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::Value;

    use super::*;

    fn epoch() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    #[test]
    fn fresh_document_has_canonical_defaults() {
        let state = GameState::fresh(epoch());
        assert_eq!(state.pet.name.as_str(), "Gob");
        assert_eq!(state.pet.level, Level::Baby);
        assert_eq!(state.pet.xp, 0);
        assert_eq!(state.pet.health, 100);
        assert_eq!(state.pet.mood, Mood::Happy);
        assert_eq!(state.environment.water_cleanliness, 100);
        assert!(!state.environment.is_night);
        assert_eq!(state.stats.first_play_time, epoch());
        assert_eq!(state.stats.last_active_time, epoch());
        assert!(state.settings.is_first_run);
        assert!(!state.is_paused());
    }

    #[test]
    fn json_layout_matches_extension_keys() {
        let value = serde_json::to_value(GameState::fresh(epoch())).unwrap();
        assert_eq!(value["pet"]["level"], Value::from(1));
        assert_eq!(value["pet"]["mood"], Value::from("HAPPY"));
        assert_eq!(value["environment"]["tabCount"], Value::from(0));
        assert_eq!(value["environment"]["waterCleanliness"], Value::from(100));
        assert_eq!(value["stats"]["totalXP"], Value::from(0));
        assert_eq!(
            value["stats"]["lastActiveTime"],
            Value::from(1_700_000_000_000_i64)
        );
        assert_eq!(value["settings"]["focusModeActive"], Value::from(false));
        assert_eq!(value["settings"]["consoleVariant"], Value::from("CLASSIC"));
        assert_eq!(value["settings"]["lcdPalette"], Value::from("GREEN"));
    }

    #[test]
    fn documents_without_display_settings_still_load() {
        let json = r#"{
            "pet": {"name": "Gob", "level": 2, "xp": 40, "health": 80, "mood": "GREEDY"},
            "environment": {"tabCount": 12, "waterCleanliness": 70, "isNight": true},
            "stats": {"tabsClosed": 30, "totalXP": 140, "lastActiveTime": 1700000000000, "firstPlayTime": 1690000000000},
            "settings": {"soundEnabled": true, "focusModeActive": false, "isFirstRun": false}
        }"#;
        let state: GameState = serde_json::from_str(json).unwrap();
        assert_eq!(state.pet.level, Level::Teen);
        assert_eq!(state.stats.total_xp, 140);
        assert_eq!(state.settings.console_variant, ConsoleVariant::Classic);
        assert_eq!(state.settings.lcd_palette, LcdPalette::Green);
    }

    #[test]
    fn document_with_invalid_name_is_rejected() {
        let mut value = serde_json::to_value(GameState::fresh(epoch())).unwrap();
        value["pet"]["name"] = Value::from("   ");
        assert!(serde_json::from_value::<GameState>(value).is_err());
    }
}
