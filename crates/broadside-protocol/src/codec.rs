//! Codec trait and implementations for serializing/deserializing frames.
//!
//! The server never calls `serde_json` directly; it goes through a
//! [`Codec`], so the wire format can change without touching the
//! handler or the match layer.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts values to frames and back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes a frame back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the frame is malformed or has
    /// the wrong shape for `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Browser clients speak JSON natively, so this is the only codec the
/// server ships with. It is behind the `json` feature (on by default).
///
/// ## Example
///
/// ```rust
/// use broadside_protocol::{ClientIntent, Codec, Envelope, JsonCodec};
///
/// let codec = JsonCodec;
///
/// let frame = br#"{"type":"joinLobby","code":"abc123"}"#;
/// let envelope: Envelope<ClientIntent> = codec.decode(frame).unwrap();
/// assert_eq!(envelope.seq, 0);
/// assert_eq!(
///     envelope.payload,
///     ClientIntent::JoinLobby { code: "abc123".into() }
/// );
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
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientIntent, Envelope, ServerEvent};

    #[test]
    fn test_json_codec_decodes_bare_intent_without_envelope_fields() {
        let env: Envelope<ClientIntent> =
            JsonCodec.decode(br#"{"type":"createLobby"}"#).unwrap();
        assert_eq!(env.seq, 0);
        assert_eq!(env.timestamp, 0);
        assert_eq!(env.payload, ClientIntent::CreateLobby);
    }

    #[test]
    fn test_json_codec_encodes_envelope_flat() {
        let env = Envelope::new(3, 250, ServerEvent::PlacementConfirmed);
        let bytes = JsonCodec.encode(&env).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["seq"], 3);
        assert_eq!(json["timestamp"], 250);
        assert_eq!(json["type"], "placementConfirmed");
    }

    #[test]
    fn test_json_codec_decode_garbage_is_decode_error() {
        let result: Result<Envelope<ClientIntent>, _> =
            JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
