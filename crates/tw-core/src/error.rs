use crate::config::ConfigError;
use crate::event::EventId;

/// Alias for `Result<T, TwError>`.
pub type TwResult<T> = Result<T, TwError>;

/// Errors that can occur when recording or replaying a session.
#[derive(Debug, thiserror::Error)]
pub enum TwError {
    /// The requested event ID does not exist in the log.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// No message event from the given actor exists in the log.
    #[error("no message found for actor \"{0}\"")]
    MessageNotFound(String),

    /// A diff path cannot be resolved for reading or writing.
    #[error("invalid path \"{path}\": {reason}")]
    InvalidPath {
        /// The offending dot-delimited path.
        path: String,
        /// Why the path could not be resolved.
        reason: String,
    },

    /// An operation tag is not one of the supported operations.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// An event type tag is not one of the supported event types.
    #[error("invalid event type: {0}")]
    InvalidEventType(String),

    /// An arithmetic operation met a non-numeric operand.
    #[error("cannot {operation} non-numeric value at \"{path}\"")]
    NonNumeric {
        /// The path the operation was applied at.
        path: String,
        /// The arithmetic operation that failed.
        operation: String,
    },

    /// A diff left a character record in a shape that is no longer valid.
    #[error("invalid character \"{id}\": {reason}")]
    InvalidCharacter {
        /// The character ID.
        id: String,
        /// The deserialization failure.
        reason: String,
    },

    /// Loading or validating a game configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TwError {
    /// Build an [`TwError::InvalidPath`] from anything string-like.
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
