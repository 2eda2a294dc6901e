//! Unified error type for the Draftkit server.

use draftkit_engine::CatalogError;
use draftkit_protocol::ProtocolError;
use draftkit_store::StoreError;
use draftkit_sync::SyncError;
use tokio_tungstenite::tungstenite;

/// Top-level error that wraps the errors of every layer.
///
/// The `#[from]` variants let `?` convert sub-crate errors, so server and
/// watcher code deals with one type.
#[derive(Debug, thiserror::Error)]
pub enum DraftkitError {
    /// Binding, accepting, or reading a file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// WebSocket handshake or frame error.
    #[error(transparent)]
    WebSocket(#[from] tungstenite::Error),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Hub failure (unknown session, bad token, rejected command).
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The unit catalog file is unusable.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[cfg(test)]
mod tests {
    use draftkit_protocol::SessionKey;

    use super::*;

    #[test]
    fn test_from_sync_error() {
        let err: DraftkitError = SyncError::NotFound(SessionKey::new("abc")).into();
        assert!(matches!(err, DraftkitError::Sync(_)));
        assert_eq!(err.to_string(), "session D-abc not found");
    }

    #[test]
    fn test_from_protocol_error() {
        let err: DraftkitError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, DraftkitError::Protocol(_)));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_from_catalog_error() {
        let err: DraftkitError = CatalogError::NotAnArray("object").into();
        assert!(matches!(err, DraftkitError::Catalog(_)));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken");
        let err: DraftkitError = io.into();
        assert!(matches!(err, DraftkitError::Io(_)));
    }
}
