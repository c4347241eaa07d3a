//! Persistent state store for Tab Goblin.
//!
//! The store keeps the single game-state document behind an explicit cache
//! and a pluggable persistence backend, and fans every write out to local
//! subscribers.
//!
//! # Architecture
//!
//! ```text
//! GameEngine
//!     |
//!     +-- get_state / set_state --> StateStore (cache + listeners)
//!                                       |
//!                                       +-- load / save --> StateBackend
//!                                           |-- MemoryBackend   (tests)
//!                                           +-- JsonFileBackend (native host)
//! ```
//!
//! # Modules
//!
//! - [`backend`] -- The [`StateBackend`] seam and its implementations
//! - [`store`] -- [`StateStore`] cache, writes and subscriptions
//! - [`error`] -- Shared error types

pub mod backend;
pub mod error;
pub mod store;

// Re-export primary types for convenience.
pub use backend::{JsonFileBackend, MemoryBackend, StateBackend};
pub use error::StoreError;
pub use store::{Listener, StateStore, SubscriptionId};
