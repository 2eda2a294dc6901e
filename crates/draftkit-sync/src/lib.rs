//! Session synchronization for Draftkit.
//!
//! A [`DraftHub`] hosts sessions described by a [`SessionLogic`]. Each live
//! session is owned by one room actor, a Tokio task that applies owner
//! commands in order, writes every accepted revision through to the store,
//! and then publishes it to spectators.
//!
//! ```text
//!  owner ──apply──► DraftHub ──mpsc──► room actor ──save──► SessionStore
//!                                          │
//!                                        watch
//!                                          ▼
//!  spectator ◄──snapshot/update/not_found── Subscription
//! ```
//!
//! Spectators read through a `watch` channel, so a slow one only ever sees
//! the latest revision and never holds the writer back.

mod backoff;
mod config;
mod error;
mod hub;
mod logic;
mod room;
mod subscription;

pub use backoff::{Backoff, BackoffConfig};
pub use config::HubConfig;
pub use error::SyncError;
pub use hub::{Created, DraftHub};
pub use logic::SessionLogic;
pub use room::{Revision, RoomHandle};
pub use subscription::Subscription;
