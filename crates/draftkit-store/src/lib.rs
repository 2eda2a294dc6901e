//! Session persistence for Draftkit.
//!
//! The engine never touches storage. This crate defines the boundary the
//! sync layer writes through ([`SessionStore`]), two implementations
//! ([`MemoryStore`] and [`FileStore`]), the retention policy that decides
//! when an idle session is dropped ([`StoreConfig`]), and the random
//! identifiers handed out on creation.
//!
//! Records are generic over the session state, so the store does not
//! depend on the engine.

mod config;
mod error;
mod file;
mod memory;
mod record;
mod store;
mod token;

pub use config::{MAX_RETENTION, MIN_RETENTION, StoreConfig};
pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::{SessionMeta, StoredSession};
pub use store::SessionStore;
pub use token::{generate_key, generate_token, is_valid_key};
