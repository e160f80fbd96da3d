//! Error types for the session engine.

use thiserror::Error;
use tw_core::TwError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while running a session.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The underlying state machine rejected the operation.
    #[error(transparent)]
    Core(#[from] TwError),

    /// A dice expression could not be parsed.
    #[error("invalid dice notation: {0}")]
    InvalidNotation(String),

    /// No session with the given ID is registered.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A console command was malformed.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// A console command is not recognized.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// State could not be rendered as JSON.
    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}
