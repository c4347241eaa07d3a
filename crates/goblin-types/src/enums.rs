//! Enumeration types for the Tab Goblin state document.
//!
//! Mood and level drive the pet's sprite and behaviour; console variant and
//! LCD palette are presentation settings that the engine only stores.

use core::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Mood
// ---------------------------------------------------------------------------

/// Categorical pet state derived from tab count and health.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Mood {
    /// Tab count is within the safe range.
    #[default]
    Happy,
    /// Tab count is above the safe range.
    Greedy,
    /// Tab count is above the danger threshold.
    Corrupt,
    /// Health reached zero. Only a revive leaves this state.
    Dead,
}

impl Mood {
    /// Whether the pet is dead.
    pub const fn is_dead(self) -> bool {
        matches!(self, Self::Dead)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Happy => write!(f, "HAPPY"),
            Self::Greedy => write!(f, "GREEDY"),
            Self::Corrupt => write!(f, "CORRUPT"),
            Self::Dead => write!(f, "DEAD"),
        }
    }
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// Evolution stage of the pet.
///
/// Serialized as the plain number `1`, `2` or `3` so the document keeps the
/// layout the extension UI reads.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    /// Baby goblin.
    #[default]
    Baby = 1,
    /// Teen goblin.
    Teen = 2,
    /// Monster goblin, the final stage.
    Monster = 3,
}

impl Level {
    /// The highest reachable level.
    pub const MAX: Self = Self::Monster;

    /// The level after this one, or `None` at the final stage.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Baby => Some(Self::Teen),
            Self::Teen => Some(Self::Monster),
            Self::Monster => None,
        }
    }

    /// Numeric value of the level (1-based).
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for Level {
    type Error = InvalidLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Baby),
            2 => Ok(Self::Teen),
            3 => Ok(Self::Monster),
            other => Err(InvalidLevel(other)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// A numeric level outside `1..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid level {0}: expected 1, 2 or 3")]
pub struct InvalidLevel(pub u8);

// ---------------------------------------------------------------------------
// Presentation settings
// ---------------------------------------------------------------------------

/// Handheld console shell drawn around the LCD.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum ConsoleVariant {
    /// The original brick-shaped handheld.
    #[default]
    Classic,
    /// The slimmer pocket model.
    Pocket,
    /// The colour model.
    Color,
}

/// Colour palette of the LCD screen.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum LcdPalette {
    /// Pea-green four-shade palette.
    #[default]
    Green,
    /// Neutral grayscale.
    Gray,
    /// Warm amber backlight.
    Amber,
    /// Cool blue backlight.
    Blue,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn level_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Level::Teen).unwrap(), "2");
        let parsed: Level = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, Level::Monster);
    }

    #[test]
    fn level_rejects_out_of_range() {
        assert!(serde_json::from_str::<Level>("0").is_err());
        assert!(serde_json::from_str::<Level>("4").is_err());
        assert_eq!(Level::try_from(9), Err(InvalidLevel(9)));
    }

    #[test]
    fn level_next_stops_at_max() {
        assert_eq!(Level::Baby.next(), Some(Level::Teen));
        assert_eq!(Level::Teen.next(), Some(Level::Monster));
        assert_eq!(Level::MAX.next(), None);
        assert!(Level::Baby < Level::Monster);
    }

    #[test]
    fn mood_uses_screaming_case() {
        assert_eq!(serde_json::to_string(&Mood::Corrupt).unwrap(), "\"CORRUPT\"");
        let parsed: Mood = serde_json::from_str("\"DEAD\"").unwrap();
        assert!(parsed.is_dead());
        assert_eq!(Mood::Greedy.to_string(), "GREEDY");
    }

    #[test]
    fn settings_enums_round_trip_names() {
        assert_eq!(
            serde_json::to_string(&ConsoleVariant::Pocket).unwrap(),
            "\"POCKET\""
        );
        assert_eq!(serde_json::to_string(&LcdPalette::Amber).unwrap(), "\"AMBER\"");
    }
}
