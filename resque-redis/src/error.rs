//! Redis error types.

use thiserror::Error;

/// Result type for Redis operations.
pub type Result<T> = std::result::Result<T, RedisError>;

/// Errors raised while talking to the Redis backend.
#[derive(Debug, Error)]
pub enum RedisError {
    /// Connection could not be established or was lost.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Connection pool error.
    #[error("Pool error: {0}")]
    Pool(String),

    /// Command was rejected by the server.
    #[error("Command error: {0}")]
    Command(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timed out waiting for a pooled connection.
    #[error("Operation timed out")]
    Timeout,

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Underlying Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl RedisError {
    /// Check if this error is transient and the caller may try again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout | Self::Pool(_) => true,
            Self::Redis(err) => err.is_timeout() || err.is_connection_dropped(),
            _ => false,
        }
    }

    /// Check if this error indicates the store is unreachable.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout => true,
            Self::Redis(err) => err.is_io_error() || err.is_connection_refusal(),
            _ => false,
        }
    }
}

impl<E> From<bb8::RunError<E>> for RedisError
where
    E: std::error::Error + 'static,
{
    fn from(err: bb8::RunError<E>) -> Self {
        match err {
            bb8::RunError::TimedOut => Self::Timeout,
            bb8::RunError::User(e) => Self::Pool(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for RedisError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
