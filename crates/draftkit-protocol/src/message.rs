//! Messages that travel between a Draftkit server and its clients.
//!
//! There are two audiences:
//!
//! - **Spectators** send a single [`ClientMessage::Watch`] and from then on
//!   only receive [`SyncEvent`]s. They never mutate anything.
//! - **The owner** creates a session and sends [`ClientMessage::Command`]s,
//!   receiving [`ServerMessage::Accepted`] or [`ServerMessage::Rejected`]
//!   for each one.
//!
//! The message types are generic over the session state, config and
//! command types so this crate does not depend on the draft engine. The
//! server instantiates them with the engine's concrete types.

use serde::{Deserialize, Serialize};

use crate::SessionKey;

// ---------------------------------------------------------------------------
// SyncEvent: the spectator contract
// ---------------------------------------------------------------------------

/// One event of the spectator stream.
///
/// Both `Snapshot` and `Update` carry the *full* session state, never a
/// diff. A spectator that missed any number of updates is consistent
/// again as soon as the next one arrives.
///
/// `revision` increases by one for every accepted mutation of the
/// session, so a client can drop anything older than what it already
/// rendered.
///
/// JSON shape (internally tagged, snake_case):
///
/// ```text
/// { "type": "snapshot", "revision": 3, "session": { ... } }
/// { "type": "update",   "revision": 4, "session": { ... } }
/// { "type": "not_found" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent<S> {
    /// Sent right after subscribing, and again after every reconnect.
    Snapshot { revision: u64, session: S },

    /// Sent after each accepted mutation.
    Update { revision: u64, session: S },

    /// The session does not exist or has expired. Terminal: the
    /// subscriber should stop retrying.
    NotFound,
}

impl<S> SyncEvent<S> {
    /// `true` for [`SyncEvent::NotFound`].
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// The revision carried by a snapshot or update.
    pub fn revision(&self) -> Option<u64> {
        match self {
            Self::Snapshot { revision, .. } | Self::Update { revision, .. } => {
                Some(*revision)
            }
            Self::NotFound => None,
        }
    }

    /// The session state carried by a snapshot or update.
    pub fn session(&self) -> Option<&S> {
        match self {
            Self::Snapshot { session, .. } | Self::Update { session, .. } => {
                Some(session)
            }
            Self::NotFound => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

/// Client → server messages.
///
/// - `C` is the session configuration type used by `Create`.
/// - `M` is the owner command type used by `Command`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage<C, M> {
    /// Subscribe to a session's event stream as a spectator.
    Watch { key: SessionKey },

    /// Create a new session. The reply carries the key and owner token.
    Create { config: C },

    /// Mutate a session. Requires the owner token issued by `Create`.
    Command {
        key: SessionKey,
        token: String,
        command: M,
    },

    /// Keep-alive. Echoed back with the server time.
    Heartbeat { client_time: u64 },
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// Server → client messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage<S> {
    /// A spectator event.
    Event { event: SyncEvent<S> },

    /// Reply to `Create`.
    Created {
        key: SessionKey,
        owner_token: String,
    },

    /// Reply to a `Command` that was applied.
    Accepted { key: SessionKey, revision: u64 },

    /// Reply to a `Command` (or malformed frame) that was refused.
    /// `code` follows HTTP conventions: 400 malformed, 403 bad token,
    /// 404 unknown session, 409 illegal draft transition.
    Rejected { code: u16, reason: String },

    /// Reply to `Heartbeat`.
    HeartbeatAck { client_time: u64, server_time: u64 },
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Wrapper around every frame the server sends.
///
/// `seq` counts frames per connection; `timestamp` is milliseconds since
/// the connection was accepted. Neither is needed for correctness (the
/// session revision is), but both are handy when reading client logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<P> {
    pub seq: u64,
    pub timestamp: u64,
    pub payload: P,
}

// =========================================================================
// Tests
// =========================================================================
