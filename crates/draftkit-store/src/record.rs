//! What the store keeps per session.

use chrono::{DateTime, Utc};
use draftkit_protocol::SessionKey;
use serde::{Deserialize, Serialize};

/// One persisted session: the state plus the metadata the store can be
/// queried by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession<S> {
    pub key: SessionKey,
    /// Secret presented with every owner command.
    pub owner_token: String,
    /// Bumped on every accepted mutation. Starts at 0 on creation.
    pub revision: u64,
    pub complete: bool,
    pub last_activity: DateTime<Utc>,
    pub state: S,
}

impl<S> StoredSession<S> {
    pub fn meta(&self) -> SessionMeta {
        SessionMeta {
            key: self.key.clone(),
            revision: self.revision,
            complete: self.complete,
            last_activity: self.last_activity,
        }
    }
}

/// Queryable summary of a stored session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub key: SessionKey,
    pub revision: u64,
    pub complete: bool,
    pub last_activity: DateTime<Utc>,
}
