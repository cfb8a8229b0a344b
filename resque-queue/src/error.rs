//! Error types for queue operations.

use resque_redis::RedisError;
use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Queue-specific errors.
///
/// Absence (an unknown failed job id, an unknown worker) is never an error;
/// those lookups return `bool` or `Option`.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The backing store could not complete a command.
    #[error("Store error: {0}")]
    Store(#[from] RedisError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Job class is not registered with a strict registry
    #[error("Unknown job class: {0}")]
    UnknownJobClass(String),

    /// Job arguments are not a JSON object
    #[error("Invalid job arguments: {0}")]
    InvalidArguments(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueueError {
    /// Check if the error came from the store being unreachable.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_connection_error())
    }
}
