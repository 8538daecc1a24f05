//! Error types for the protocol layer.

/// Errors that can occur while turning frames into requests and replies
/// into frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes were not a well-formed message of the expected type:
    /// malformed JSON, an unknown `op` or command `type`, a wrongly typed
    /// field.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but cannot be processed (e.g. not valid UTF-8
    /// where text was required).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
