//! Configuration loading and typed config structures for Tab Goblin.
//!
//! Every balance value and timing constant lives in `goblin-config.yaml`.
//! This module mirrors the YAML structure in strongly-typed structs, fills
//! missing keys with the shipped defaults and validates the result.
//!
//! Fractional values (the diminishing-returns multiplier) are
//! [`Decimal`]s so no game rule ever touches floating point.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The values parsed but are inconsistent.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
///
/// Mirrors the structure of `goblin-config.yaml`. All fields have defaults
/// matching the shipped game balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Tab-count breakpoints.
    #[serde(default)]
    pub tabs: TabThresholds,

    /// XP rewards and level thresholds.
    #[serde(default)]
    pub xp: XpConfig,

    /// Anti-farming reward decay.
    #[serde(default)]
    pub diminishing_returns: DiminishingReturnsConfig,

    /// Health gains and penalties.
    #[serde(default)]
    pub health: HealthConfig,

    /// Water cleanliness levels and the night window.
    #[serde(default)]
    pub environment: EnvironmentConfig,

    /// Timer intervals.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Where the state document is stored.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load and validate configuration from a YAML file at the given path.
    ///
    /// The `GOBLIN_DATA_DIR` environment variable overrides
    /// `storage.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if the values are inconsistent.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.storage.apply_env_overrides();
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if the values are inconsistent.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };

        let tabs = &self.tabs;
        if !(tabs.safe_max <= tabs.warning_max && tabs.warning_max <= tabs.danger_max) {
            return invalid("tabs: expected safe_max <= warning_max <= danger_max");
        }
        if self.xp.level2_threshold == 0 || self.xp.level3_threshold == 0 {
            return invalid("xp: level thresholds must be at least 1");
        }
        if self.diminishing_returns.multiplier < Decimal::ZERO
            || self.diminishing_returns.multiplier > Decimal::ONE
        {
            return invalid("diminishing_returns.multiplier must be within 0..=1");
        }
        if self.diminishing_returns.reset_period_minutes == 0 {
            return invalid("diminishing_returns.reset_period_minutes must be at least 1");
        }
        if self.health.max == 0 || self.health.max > goblin_types::STAT_MAX {
            return invalid("health.max must be within 1..=100");
        }
        if self.health.revive_health == 0 || self.health.revive_health > self.health.max {
            return invalid("health.revive_health must be within 1..=max");
        }
        let env = &self.environment;
        if [
            env.clean_water,
            env.warning_water,
            env.danger_water,
            env.critical_water,
        ]
        .iter()
        .any(|&w| w > goblin_types::STAT_MAX)
        {
            return invalid("environment: water levels must be within 0..=100");
        }
        if env.night_start_hour > 23 || env.night_end_hour > 23 {
            return invalid("environment: night hours must be within 0..=23");
        }
        if self.timing.health_check_interval_minutes == 0 {
            return invalid("timing.health_check_interval_minutes must be at least 1");
        }
        Ok(())
    }
}

/// Tab-count breakpoints, in ascending severity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TabThresholds {
    /// Highest tab count that is still fully safe.
    #[serde(default = "default_safe_max")]
    pub safe_max: u32,

    /// Highest tab count with only a mild penalty.
    #[serde(default = "default_warning_max")]
    pub warning_max: u32,

    /// Above this count the pet turns corrupt and takes damage.
    #[serde(default = "default_danger_max")]
    pub danger_max: u32,
}

impl Default for TabThresholds {
    fn default() -> Self {
        Self {
            safe_max: default_safe_max(),
            warning_max: default_warning_max(),
            danger_max: default_danger_max(),
        }
    }
}

/// XP rewards and level thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct XpConfig {
    /// XP credited per closed tab before diminishing returns.
    #[serde(default = "default_base_per_tab")]
    pub base_per_tab: u32,

    /// XP needed at level 1 to reach level 2.
    #[serde(default = "default_level2_threshold")]
    pub level2_threshold: u32,

    /// XP needed at level 2 to reach level 3.
    #[serde(default = "default_level3_threshold")]
    pub level3_threshold: u32,
}

impl Default for XpConfig {
    fn default() -> Self {
        Self {
            base_per_tab: default_base_per_tab(),
            level2_threshold: default_level2_threshold(),
            level3_threshold: default_level3_threshold(),
        }
    }
}

/// Anti-farming reward decay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiminishingReturnsConfig {
    /// Closes per window that earn full XP.
    #[serde(default = "default_start_after_tabs")]
    pub start_after_tabs: u32,

    /// Multiplier applied (then floored) once the window is exhausted.
    #[serde(default = "default_multiplier")]
    pub multiplier: Decimal,

    /// Window length in minutes, measured from the last reset.
    #[serde(default = "default_reset_period_minutes")]
    pub reset_period_minutes: u32,
}

impl Default for DiminishingReturnsConfig {
    fn default() -> Self {
        Self {
            start_after_tabs: default_start_after_tabs(),
            multiplier: default_multiplier(),
            reset_period_minutes: default_reset_period_minutes(),
        }
    }
}

/// Health gains and penalties.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthConfig {
    /// Health ceiling.
    #[serde(default = "default_health_max")]
    pub max: u32,

    /// Health restored per credited tab close.
    #[serde(default = "default_boost_per_tab_closed")]
    pub boost_per_tab_closed: u32,

    /// Damage per health check while above the danger threshold.
    #[serde(default = "default_corruption_damage_per_check")]
    pub corruption_damage_per_check: u32,

    /// Damage per health check while neglected.
    #[serde(default = "default_neglect_damage_per_check")]
    pub neglect_damage_per_check: u32,

    /// Hours without activity before neglect damage applies.
    #[serde(default = "default_neglect_threshold_hours")]
    pub neglect_threshold_hours: u32,

    /// Health a revived pet comes back with.
    #[serde(default = "default_revive_health")]
    pub revive_health: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max: default_health_max(),
            boost_per_tab_closed: default_boost_per_tab_closed(),
            corruption_damage_per_check: default_corruption_damage_per_check(),
            neglect_damage_per_check: default_neglect_damage_per_check(),
            neglect_threshold_hours: default_neglect_threshold_hours(),
            revive_health: default_revive_health(),
        }
    }
}

/// Water cleanliness levels and the night window.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvironmentConfig {
    /// Cleanliness at or below the safe tab count.
    #[serde(default = "default_clean_water")]
    pub clean_water: u32,

    /// Cleanliness above the safe count, up to the warning count.
    #[serde(default = "default_warning_water")]
    pub warning_water: u32,

    /// Cleanliness above the warning count, up to the danger count.
    #[serde(default = "default_danger_water")]
    pub danger_water: u32,

    /// Cleanliness above the danger count.
    #[serde(default = "default_critical_water")]
    pub critical_water: u32,

    /// Local hour (0-23) at which night begins.
    #[serde(default = "default_night_start_hour")]
    pub night_start_hour: u32,

    /// Local hour (0-23) at which night ends.
    #[serde(default = "default_night_end_hour")]
    pub night_end_hour: u32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            clean_water: default_clean_water(),
            warning_water: default_warning_water(),
            danger_water: default_danger_water(),
            critical_water: default_critical_water(),
            night_start_hour: default_night_start_hour(),
            night_end_hour: default_night_end_hour(),
        }
    }
}

/// Timer intervals.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Minutes between periodic health checks.
    #[serde(default = "default_health_check_interval_minutes")]
    pub health_check_interval_minutes: u64,

    /// Quiet period before a burst of tab events becomes one count update.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl TimingConfig {
    /// Health-check interval as a [`Duration`].
    pub const fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_minutes.saturating_mul(60))
    }

    /// Debounce window as a [`Duration`].
    pub const fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            health_check_interval_minutes: default_health_check_interval_minutes(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Where the state document is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Data directory. `None` selects the platform data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Apply `GOBLIN_DATA_DIR` if set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("GOBLIN_DATA_DIR")
            && !dir.is_empty()
        {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_safe_max() -> u32 {
    10
}

const fn default_warning_max() -> u32 {
    25
}

const fn default_danger_max() -> u32 {
    50
}

const fn default_base_per_tab() -> u32 {
    5
}

const fn default_level2_threshold() -> u32 {
    100
}

const fn default_level3_threshold() -> u32 {
    250
}

const fn default_start_after_tabs() -> u32 {
    10
}

const fn default_multiplier() -> Decimal {
    // 0.1
    Decimal::from_parts(1, 0, 0, false, 1)
}

const fn default_reset_period_minutes() -> u32 {
    60
}

const fn default_health_max() -> u32 {
    100
}

const fn default_boost_per_tab_closed() -> u32 {
    2
}

const fn default_corruption_damage_per_check() -> u32 {
    1
}

const fn default_neglect_damage_per_check() -> u32 {
    20
}

const fn default_neglect_threshold_hours() -> u32 {
    24
}

const fn default_revive_health() -> u32 {
    50
}

const fn default_clean_water() -> u32 {
    100
}

const fn default_warning_water() -> u32 {
    70
}

const fn default_danger_water() -> u32 {
    40
}

const fn default_critical_water() -> u32 {
    10
}

const fn default_night_start_hour() -> u32 {
    22
}

const fn default_night_end_hour() -> u32 {
    6
}

const fn default_health_check_interval_minutes() -> u64 {
    1
}

const fn default_debounce_ms() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_owned()
}
