//! Error types for delta decoding.

use thiserror::Error;

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors raised while turning a raw payload into a [`crate::Delta`].
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The payload is not JSON or does not match the maindata schema.
    #[error("malformed maindata payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload carries no `rid`.
    #[error("maindata payload has no rid")]
    MissingRevision,

    /// The server answered with a revision older than the one requested.
    #[error("revision went backwards: requested with rid {prior}, server sent rid {received}")]
    RevisionRegression {
        /// Cursor the request was made with.
        prior: u64,
        /// Revision the server returned.
        received: u64,
    },
}
