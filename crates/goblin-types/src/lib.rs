//! Shared type definitions for Tab Goblin.
//!
//! This crate is the single source of truth for the persisted state
//! document and the message protocol spoken with the extension UI. Types
//! flow downstream to `TypeScript` via `ts-rs` so the UI reads exactly the
//! shapes the engine writes.
//!
//! # Modules
//!
//! - [`enums`] -- Mood, level and presentation-setting enumerations
//! - [`name`] -- Validated [`PetName`]
//! - [`state`] -- The [`GameState`] document and its parts
//! - [`message`] -- Requests, responses, notifications and wire envelopes

pub mod enums;
pub mod message;
pub mod name;
pub mod state;

// Re-export all public types at crate root for convenience.
pub use enums::{ConsoleVariant, InvalidLevel, LcdPalette, Level, Mood};
pub use message::{Inbound, Notification, Outbound, Request, Response, StatsSummary, TabEvent};
pub use name::{NameError, PetName};
pub use state::{
    EnvironmentState, GameSettings, GameState, GameStats, PetState, STAT_MAX, STATE_KEY,
};
