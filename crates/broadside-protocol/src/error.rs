//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means the bytes or the message shape were
//! wrong. Game-rule violations are reported by the match layer instead.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown `"type"` tag,
    /// missing fields, or wrong field types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but violates a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
