//! Random identifiers.

use draftkit_protocol::SessionKey;
use rand::Rng;

/// A 32-character hex string (128 bits). Used as the owner token.
pub fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex(&bytes)
}

/// A fresh 12-character hex session key (48 bits).
///
/// Keys are shared with spectators, so they only need to be unique, not
/// secret. The hub retries on the rare collision.
pub fn generate_key() -> SessionKey {
    let bytes: [u8; 6] = rand::rng().random();
    SessionKey(hex(&bytes))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Whether `key` is safe to use as a storage name: 1 to 64 ASCII
/// alphanumerics, `-` or `_`.
pub fn is_valid_key(key: &SessionKey) -> bool {
    let s = key.as_str();
    !s.is_empty()
        && s.len() <= 64
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
