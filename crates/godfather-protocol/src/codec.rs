//! How cached records become stored text.
//!
//! The session controller caches the player record in a key-value store
//! that only holds strings. It serializes through a [`Codec`] rather than
//! calling `serde_json` directly, so the record format lives in one place.
//! The byte methods do the work; [`Codec::encode_text`] and
//! [`Codec::decode_text`] wrap them for text storage.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Turns records into bytes and back.
///
/// `Send + Sync + 'static` because the controller holding the codec is
/// shared with the HTTP layer behind an `Arc`. Decoding produces owned
/// values (`DeserializeOwned`), never borrows from the stored text.
pub trait Codec: Send + Sync + 'static {
    /// # Errors
    /// `ProtocolError::Encode` when the value can't be serialized.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// # Errors
    /// `ProtocolError::Decode` for malformed or truncated input, or a
    /// record of another shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Like [`encode`](Codec::encode), but as a string.
    ///
    /// # Errors
    /// `ProtocolError::InvalidMessage` if the encoded bytes aren't UTF-8.
    fn encode_text<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        let bytes = self.encode(value)?;
        String::from_utf8(bytes).map_err(|e| ProtocolError::InvalidMessage(e.to_string()))
    }

    /// Deserializes a value previously written with [`Codec::encode_text`].
    fn decode_text<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        self.decode(text.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON is what the backend speaks and what the browser client stored, so a
/// cached record stays readable and can be inspected by hand.
///
/// ## Example
///
/// ```rust
/// use godfather_protocol::{Codec, JsonCodec, Player};
///
/// let codec = JsonCodec;
/// let player: Player = serde_json::from_str(
///     r#"{"player_id": "u1", "name": "Vito", "role": "Detective"}"#,
/// ).unwrap();
///
/// let text = codec.encode_text(&player).unwrap();
/// let decoded: Player = codec.decode_text(&text).unwrap();
/// assert_eq!(player, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
