//! Codec trait and implementations for turning messages into frames.
//!
//! The server never calls `serde_json` directly; it goes through a
//! [`Codec`]. Today there is one implementation, [`JsonCodec`], because
//! browsers render spectator views and JSON is what they read natively.
//! Session snapshots are stored with the same codec, so a stored session
//! and a wire snapshot are byte-for-byte the same document.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value cannot be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or do
    /// not match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Encodes into a `String` for text frames.
    ///
    /// The default goes through [`encode`](Self::encode) and rejects
    /// non-UTF-8 output, which a text codec never produces.
    fn encode_text<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        let bytes = self.encode(value)?;
        String::from_utf8(bytes)
            .map_err(|e| ProtocolError::InvalidMessage(format!("non-UTF-8 frame: {e}")))
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use draftkit_protocol::{Codec, Envelope, JsonCodec, ServerMessage};
///
/// let codec = JsonCodec;
/// let env = Envelope {
///     seq: 1,
///     timestamp: 5000,
///     payload: ServerMessage::<()>::HeartbeatAck { client_time: 10, server_time: 12 },
/// };
///
/// let bytes = codec.encode(&env).unwrap();
/// let back: Envelope<ServerMessage<()>> = codec.decode(&bytes).unwrap();
/// assert_eq!(env, back);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }

    fn encode_text<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientMessage, SessionKey};

    #[test]
    fn test_json_codec_decode_garbage_returns_decode_error() {
        let result: Result<ClientMessage<(), ()>, _> = JsonCodec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_encode_text_matches_encode() {
        let msg: ClientMessage<(), ()> = ClientMessage::Watch {
            key: SessionKey::new("k"),
        };
        let text = JsonCodec.encode_text(&msg).unwrap();
        let bytes = JsonCodec.encode(&msg).unwrap();
        assert_eq!(text.as_bytes(), bytes.as_slice());
    }
}
