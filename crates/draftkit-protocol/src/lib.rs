//! Wire protocol for Draftkit.
//!
//! This crate defines the "language" spoken between the draft server, the
//! owner's client, and any number of spectators:
//!
//! - **Identities** ([`SessionKey`], [`UnitId`], [`Side`], [`PerSide`]):
//!   small values every other crate builds on.
//! - **Messages** ([`SyncEvent`], [`ClientMessage`], [`ServerMessage`],
//!   [`Envelope`]): what travels on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   turned into bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (frames) → Protocol (messages) → Sync hub (sessions) → Engine
//! ```
//!
//! The protocol layer knows nothing about drafts. Message types are
//! generic over the state/config/command payloads so the engine can
//! evolve without touching the wire framing.

mod codec;
mod error;
mod message;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{ClientMessage, Envelope, ServerMessage, SyncEvent};
pub use types::{PerSide, SessionKey, Side, UnitId};
