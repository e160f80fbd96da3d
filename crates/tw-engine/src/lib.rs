//! Session engine for Taleweaver tables.
//!
//! Wraps a [`tw_core::StateMachine`] with the operations a table actually
//! performs: messages, actions, state updates, turns and dice rolls. Also
//! provides a text console for interactive play and a session store for
//! hosts that run several tables.

pub mod config;
pub mod console;
pub mod dice;
pub mod engine;
pub mod error;
pub mod store;

pub use config::EngineConfig;
pub use dice::{DiceResult, DiceRoll, Difficulty, Notation};
pub use engine::GameEngine;
pub use error::{EngineError, EngineResult};
pub use store::{InMemorySessionStore, SessionStore};
