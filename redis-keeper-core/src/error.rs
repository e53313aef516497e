//! Error types for Redis operations

use std::io;
use thiserror::Error;

/// Result type for Redis operations
pub type RedisResult<T> = Result<T, RedisError>;

/// Comprehensive error type for Redis operations
#[derive(Error, Debug)]
pub enum RedisError {
    /// A connection could not be established (dial, TLS handshake, AUTH or SELECT)
    #[error("Connect error: {0}")]
    Connect(String),

    /// No connection became available within the pool's wait bound
    #[error("Connection pool exhausted: no connection available within {waited_ms}ms")]
    PoolExhausted {
        /// How long the caller waited before giving up
        waited_ms: u128,
    },

    /// The pool has been drained and accepts no more work
    #[error("Connection pool is closed")]
    PoolClosed,

    /// IO error during network operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Protocol parsing error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Read or write exceeded its configured timeout
    #[error("Operation timed out")]
    Timeout,

    /// The server closed the connection mid-command
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// Server returned an error reply
    #[error("Server error: {0}")]
    Server(String),

    /// A typed accessor was used against a reply of another shape
    #[error("Reply shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Shape the caller asked for
        expected: &'static str,
        /// Description of the reply actually received
        actual: String,
    },

    /// Option builder flags that cannot be combined
    #[error("Invalid option combination: {0}")]
    InvalidOptionCombination(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// TLS setup failure
    #[error("TLS error: {0}")]
    Tls(String),
}

impl RedisError {
    /// Build a shape mismatch error for `actual`, described by its `Debug` form
    pub fn shape(expected: &'static str, actual: impl std::fmt::Debug) -> Self {
        Self::ShapeMismatch {
            expected,
            actual: format!("{actual:?}"),
        }
    }

    /// Whether this error leaves the connection that produced it unusable.
    ///
    /// A connection that saw one of these errors may have unread or half
    /// written frames on the wire and must not be handed to another caller.
    #[must_use]
    pub const fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Protocol(_) | Self::Timeout | Self::ConnectionClosed
        )
    }

    /// Whether retrying the same operation later may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PoolExhausted { .. }
                | Self::Connect(_)
                | Self::Io(_)
                | Self::Timeout
                | Self::ConnectionClosed
        )
    }

    /// Server error prefix such as `ERR` or `WRONGTYPE`
    #[must_use]
    pub fn server_code(&self) -> Option<&str> {
        match self {
            Self::Server(msg) => msg.split_whitespace().next(),
            _ => None,
        }
    }
}
