//! Presentation-layer request dispatch.
//!
//! Maps each [`Request`] onto the engine operation that serves it. Input
//! validation happens here, at the boundary: an invalid pet name is
//! answered with [`Response::Rejected`] and the document is not touched.

use goblin_types::{PetName, Request, Response};
use tracing::debug;

use crate::engine::GameEngine;

impl GameEngine {
    /// Serve one presentation-layer request.
    pub fn handle_request(&mut self, request: Request) -> Response {
        match request {
            Request::GetState => Response::State {
                state: self.state(),
            },
            Request::GetStats => Response::Stats {
                stats: self.stats_summary(),
            },
            Request::ToggleFocusMode => Response::FocusMode {
                active: self.toggle_focus_mode(),
            },
            Request::ReviveGoblin => {
                self.revive_goblin();
                Response::Ack
            }
            Request::RenamePet { name } => match PetName::parse(&name) {
                Ok(name) => {
                    self.rename_pet(name);
                    Response::Ack
                }
                Err(e) => {
                    debug!(error = %e, "Rename rejected");
                    Response::Rejected {
                        reason: e.to_string(),
                    }
                }
            },
            Request::SetSoundEnabled { enabled } => {
                self.set_sound_enabled(enabled);
                Response::Ack
            }
            Request::SetConsoleVariant { variant } => {
                self.set_console_variant(variant);
                Response::Ack
            }
            Request::SetLcdPalette { palette } => {
                self.set_lcd_palette(palette);
                Response::Ack
            }
            Request::CompleteTutorial => {
                self.complete_tutorial();
                Response::Ack
            }
            Request::ResetGame => {
                self.reset_game();
                Response::Ack
            }
        }
    }
}
