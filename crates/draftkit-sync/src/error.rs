//! Error types for the sync layer.

use draftkit_protocol::SessionKey;
use draftkit_store::StoreError;

/// Errors returned to session owners.
///
/// Spectators never see these: for them a missing session is a
/// `not_found` event, and everything else is invisible.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No live or stored session has this key.
    #[error("session {0} not found")]
    NotFound(SessionKey),

    /// The owner token does not match.
    #[error("invalid owner token for session {0}")]
    Unauthorized(SessionKey),

    /// The game logic refused the command. Nothing changed.
    #[error("command rejected ({code}): {reason}")]
    Rejected { code: &'static str, reason: String },

    /// The room actor stopped (destroyed or expired mid-request).
    #[error("session {0} is unavailable")]
    Unavailable(SessionKey),

    /// The store failed. For a mutation this means it was not applied.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    /// HTTP-style status used in rejection replies.
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::Unavailable(_) => 404,
            Self::Unauthorized(_) => 403,
            Self::Rejected { .. } => 409,
            Self::Store(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let key = SessionKey::new("k");
        assert_eq!(SyncError::NotFound(key.clone()).status(), 404);
        assert_eq!(SyncError::Unauthorized(key).status(), 403);
        assert_eq!(
            SyncError::Rejected {
                code: "wrong_turn",
                reason: "x".into()
            }
            .status(),
            409
        );
    }

    #[test]
    fn test_rejected_display_includes_code() {
        let err = SyncError::Rejected {
            code: "wrong_turn",
            reason: "expected slot 1".into(),
        };
        assert_eq!(err.to_string(), "command rejected (wrong_turn): expected slot 1");
    }
}
