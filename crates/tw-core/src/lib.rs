//! Core types for Taleweaver: an event-sourced tabletop session.
//!
//! Game state is never stored directly. A session is a [`GameConfig`] plus
//! an append-only [`EventLog`]; the current [`GameState`] is derived by
//! replaying the log over the configured initial state. That makes
//! rollback, retroactive edits and message redraws plain log operations.

/// Characters and their roles.
pub mod character;
/// Game configuration loading and validation.
pub mod config;
/// Error types used throughout the crate.
pub mod error;
/// Events, event types, operations and state diffs.
pub mod event;
/// The ordered event log.
pub mod log;
/// The state machine that owns a session's log.
pub mod machine;
/// Dot-path reads and mutations over JSON trees.
pub mod path;
/// Pure replay of an event log into a game state.
pub mod replay;
/// Derived game state and saved sessions.
pub mod state;

/// Re-export character types.
pub use character::{Character, CharacterType, ControlType};
/// Re-export configuration types.
pub use config::{ConfigError, GameConfig};
/// Re-export error types.
pub use error::{TwError, TwResult};
/// Re-export event types.
pub use event::{Event, EventId, EventType, Operation, StateDiff};
/// Re-export the event log.
pub use log::EventLog;
/// Re-export the state machine.
pub use machine::StateMachine;
/// Re-export replay types.
pub use replay::{AppliedDiff, derive_state};
/// Re-export state types.
pub use state::{GameSession, GameState};
