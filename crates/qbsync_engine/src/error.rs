//! Error types for the sync engine.

use qbsync_protocol::DecodeError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while polling or reading the snapshot.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The session is no longer valid; log in again before polling.
    #[error("authentication expired")]
    AuthenticationExpired,

    /// Login was rejected by the server.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The server answered with a non-success status.
    #[error("unexpected status {status}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
    },

    /// The payload did not match the maindata schema.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A looked-up key is not in the current snapshot.
    #[error("not found: {0}")]
    NotFound(String),

    /// Not connected.
    #[error("not connected to server")]
    NotConnected,
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::UnexpectedStatus { status } => *status >= 500,
            SyncError::Decode(_) => true,
            _ => false,
        }
    }

    /// Returns true if the caller must log in again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            SyncError::AuthenticationExpired | SyncError::AuthenticationFailed(_)
        )
    }
}
