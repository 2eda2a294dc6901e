//! # Draftkit
//!
//! Live draft sessions for team-vs-team matches, with any number of
//! spectators following along over WebSocket.
//!
//! This crate wires the layers into a server:
//!
//! - [`DraftLogic`] plugs the draft engine into the sync hub.
//! - [`DraftkitServer`] accepts WebSocket connections and routes
//!   `watch`, `create`, `command`, and `heartbeat` frames.
//! - [`Watcher`] is the reconnecting spectator client.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use draftkit::prelude::*;
//!
//! # async fn demo() -> Result<(), DraftkitError> {
//! let catalog = Arc::new(CatalogCache::new(UnitCatalog::default()));
//! let server = DraftkitServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .catalog(Arc::clone(&catalog))
//!     .build_in_memory()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod logic;
mod server;
mod watcher;

pub use error::DraftkitError;
pub use logic::DraftLogic;
pub use server::{DraftkitServer, DraftkitServerBuilder, ServerHub};
pub use watcher::{WatchStatus, WatchUpdate, Watcher};

/// Everything needed to run a server or follow a session.
pub mod prelude {
    pub use crate::{
        DraftLogic, DraftkitError, DraftkitServer, DraftkitServerBuilder, WatchStatus,
        WatchUpdate, Watcher,
    };
    pub use draftkit_clock::ClockConfig;
    pub use draftkit_engine::{
        CatalogCache, DraftCommand, DraftError, DraftFormat, DraftSession, Pick, SessionConfig,
        TeamSize, UnitCatalog,
    };
    pub use draftkit_protocol::{
        ClientMessage, Envelope, JsonCodec, ServerMessage, SessionKey, Side, SyncEvent,
    };
    pub use draftkit_store::{FileStore, MemoryStore, SessionStore};
    pub use draftkit_sync::{BackoffConfig, DraftHub, HubConfig};
}
