//! The `SessionLogic` trait: what the sync layer needs from a game.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Rules of the sessions a hub hosts.
///
/// The sync layer knows nothing about drafts. It creates states, feeds
/// them owner commands, and publishes the results. Everything
/// game-specific goes through this trait.
///
/// Methods take `&self` so an implementation can carry shared reference
/// data (a unit catalog, for instance) that every session reads.
pub trait SessionLogic: Send + Sync + 'static {
    /// Settings chosen when a session is created.
    type Config: Send + Sync + Clone + Serialize + DeserializeOwned + 'static;

    /// The full session state. Published to spectators as-is.
    type State: Send + Sync + Clone + Serialize + DeserializeOwned + 'static;

    /// An owner mutation.
    type Command: Send + Sync + Clone + Serialize + DeserializeOwned + 'static;

    /// Why a command was refused.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Builds the initial state.
    fn create(&self, config: Self::Config, now: DateTime<Utc>) -> Self::State;

    /// Applies `command` to `state`.
    ///
    /// The actor applies commands to a copy and only keeps it on `Ok`, so
    /// an implementation that fails halfway cannot corrupt the session.
    fn apply(
        &self,
        state: &mut Self::State,
        command: Self::Command,
        now: DateTime<Utc>,
    ) -> Result<(), Self::Error>;

    /// Whether the session has reached its final state.
    fn is_complete(&self, state: &Self::State) -> bool;

    /// Short machine-readable reason for a refusal. Default: `"rejected"`.
    fn rejection_code(&self, _error: &Self::Error) -> &'static str {
        "rejected"
    }
}
