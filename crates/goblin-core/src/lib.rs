//! Game rules, engine and tab-event plumbing for Tab Goblin.
//!
//! The [`GameEngine`] is the only writer of the state document. It owns the
//! [`StateStore`](goblin_store::StateStore), applies the pure transitions in
//! [`rules`] and pushes notifications through a [`MessageBus`]. Time comes
//! from a [`Clock`] and tab-count refreshes are debounced through a
//! [`Scheduler`], so every seam can be driven deterministically in tests.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `goblin-config.yaml` into
//!   strongly-typed structs.
//! - [`rules`] -- XP, leveling, mood, water, health and night rules.
//! - [`engine`] -- [`GameEngine`] operations.
//! - [`dispatch`] -- Request handling for the presentation layer.
//! - [`bus`] -- [`MessageBus`] trait, [`NullBus`] and [`LocalBus`].
//! - [`clock`] -- [`Clock`] trait, [`SystemClock`] and [`ManualClock`].
//! - [`debounce`] -- Trailing-edge [`Debouncer`] over a [`Scheduler`].
//! - [`monitor`] -- [`TabMonitor`] and the [`TabQuery`] seam.

pub mod bus;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod engine;
pub mod monitor;
pub mod rules;

pub use bus::{BusError, LocalBus, MessageBus, NullBus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, GameConfig};
pub use debounce::{Debouncer, ManualScheduler, Scheduler, TimerId};
pub use engine::GameEngine;
pub use monitor::{ReportedTabs, TabMonitor, TabQuery, TabQueryError};
pub use rules::{HealthCheckOutcome, TabCloseOutcome};
