//! Message protocol between the engine host and the presentation layer.
//!
//! The presentation layer never mutates state. It sends [`Request`] intents
//! and receives a [`Response`] for each, plus unsolicited [`Notification`]s
//! when the engine wants to trigger an animation or a re-render.
//!
//! On the wire every frame is wrapped in an [`Inbound`] or [`Outbound`]
//! envelope tagged by `kind`; the payloads themselves are tagged by `type`
//! with the `SCREAMING_SNAKE_CASE` names the extension already uses
//! (`GET_STATE`, `TAB_CLOSED`, `LEVEL_UP`, ...).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ConsoleVariant, LcdPalette, Level, Mood};
use crate::state::GameState;

// ---------------------------------------------------------------------------
// Tab lifecycle
// ---------------------------------------------------------------------------

/// A tab lifecycle signal from the browser.
///
/// The signal carries no payload the engine relies on; the tab count is
/// re-queried when the debounced update runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum TabEvent {
    /// A tab was opened.
    TabCreated,
    /// A tab was closed. Credits the pet before the count is refreshed.
    TabRemoved,
    /// A tab navigated or changed state.
    TabUpdated,
}

// ---------------------------------------------------------------------------
// Requests and responses
// ---------------------------------------------------------------------------

/// An intent sent by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Request {
    /// Fetch the full state document.
    GetState,
    /// Fetch the derived statistics summary.
    GetStats,
    /// Flip focus mode.
    ToggleFocusMode,
    /// Bring a dead pet back.
    ReviveGoblin,
    /// Rename the pet. The name is validated before the engine sees it.
    RenamePet {
        /// Raw, untrimmed name as typed by the user.
        name: String,
    },
    /// Enable or disable UI sounds.
    SetSoundEnabled {
        /// New value.
        enabled: bool,
    },
    /// Change the console shell.
    SetConsoleVariant {
        /// New variant.
        variant: ConsoleVariant,
    },
    /// Change the LCD palette.
    SetLcdPalette {
        /// New palette.
        palette: LcdPalette,
    },
    /// Mark the tutorial as seen.
    CompleteTutorial,
    /// Erase all progress and restore the default document.
    ResetGame,
}

/// The engine's reply to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Response {
    /// The full state document.
    State {
        /// Current document.
        state: GameState,
    },
    /// The derived statistics summary.
    Stats {
        /// Current summary.
        stats: StatsSummary,
    },
    /// Focus mode after a toggle.
    FocusMode {
        /// Whether focus mode is now active.
        active: bool,
    },
    /// The intent was applied (or was a harmless no-op).
    Ack,
    /// The intent carried invalid input and nothing changed.
    Rejected {
        /// Human-readable reason.
        reason: String,
    },
}

/// Read-only projection of the document for the stats screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct StatsSummary {
    /// Pet name.
    pub name: String,
    /// Evolution stage.
    #[ts(as = "u8")]
    pub level: Level,
    /// Health in `0..=100`.
    pub health: u32,
    /// Current mood.
    pub mood: Mood,
    /// XP toward the next level.
    pub xp: u32,
    /// Threshold of the next level, `None` at the final stage.
    pub xp_for_next_level: Option<u32>,
    /// Lifetime tabs closed.
    pub tabs_closed: u64,
    /// Lifetime XP.
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    /// Whole minutes since the document was created.
    pub play_time_minutes: u64,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// An unsolicited event pushed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Notification {
    /// A tab close was processed. Triggers the feed animation.
    TabClosed {
        /// XP credited for this close (0 when fully diminished).
        #[serde(rename = "xpGain")]
        xp_gain: u32,
    },
    /// The pet evolved. Triggers the celebration sequence.
    LevelUp {
        /// The new level.
        #[ts(as = "u8")]
        level: Level,
    },
    /// The document was written. Lets the UI re-render without polling.
    StateChanged {
        /// The document as written.
        state: GameState,
    },
}

// ---------------------------------------------------------------------------
// Wire envelopes
// ---------------------------------------------------------------------------

/// A frame received by the engine host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Inbound {
    /// A tab lifecycle signal, with the count the browser currently reports.
    Tab {
        /// What happened.
        event: TabEvent,
        /// Total open tabs at the time of the event.
        #[serde(rename = "tabCount")]
        tab_count: u32,
    },
    /// A request expecting exactly one response with the same `id`.
    Request {
        /// Correlation id chosen by the sender.
        id: u64,
        /// The intent.
        request: Request,
    },
}

/// A frame sent by the engine host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Outbound {
    /// Reply to the request with the same `id`.
    Response {
        /// Correlation id copied from the request.
        id: u64,
        /// The reply.
        response: Response,
    },
    /// A pushed notification.
    Notification {
        /// The event.
        notification: Notification,
    },
}
