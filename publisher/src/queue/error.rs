//! Error types for the queue publishing path.

use std::fmt;

use thiserror::Error;

/// Failure while publishing to the broker.
///
/// Every operation in the publish path returns one of these; callers that
/// need a uniform user-facing outcome convert at their own boundary.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Broker URL missing or invalid, broker unreachable, handshake rejected,
    /// or the connect deadline elapsed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Channel creation or queue declaration failed.
    #[error("channel error: {0}")]
    Channel(String),

    /// The message could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Send failed on an otherwise live channel, the broker nacked, or the
    /// publish deadline elapsed.
    #[error("publish error: {0}")]
    Publish(String),
}

/// Discriminant of [`QueueError`], used as a structured log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Channel,
    Serialization,
    Publish,
}

impl QueueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueueError::Connection(_) => ErrorKind::Connection,
            QueueError::Channel(_) => ErrorKind::Channel,
            QueueError::Serialization(_) => ErrorKind::Serialization,
            QueueError::Publish(_) => ErrorKind::Publish,
        }
    }

    /// Serialization failures are caller bugs; retrying cannot fix them.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, QueueError::Serialization(_))
    }
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Connection => "connection",
            ErrorKind::Channel => "channel",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Publish => "publish",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
