//! Error types for the store layer.

use draftkit_protocol::SessionKey;

/// Errors a [`SessionStore`](crate::SessionStore) can report.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key contains characters that are not safe to persist under.
    #[error("invalid session key {0}")]
    InvalidKey(SessionKey),

    /// A stored record could not be encoded or decoded.
    #[error("session record is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    /// The backing storage failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
