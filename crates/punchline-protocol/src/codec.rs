//! Codec trait and the JSON implementation.
//!
//! The server never touches serde directly; it asks its [`Codec`] to turn
//! frames into [`Envelope<Request>`](crate::Envelope) and replies back into
//! bytes. Swapping the wire format means swapping the codec.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Whether encoded output is valid UTF-8 and may travel in text frames.
    fn is_textual(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Party-game clients are mostly browsers, so JSON is the only format
/// shipped. Behind the `json` feature (on by default).
///
/// ```rust
/// use punchline_protocol::{Codec, Command, Envelope, JsonCodec, Request, SessionCode};
///
/// let codec = JsonCodec;
/// let env = Envelope::new(
///     1,
///     Request::Execute {
///         code: SessionCode::from("QXZT"),
///         command: Command::start_game(),
///     },
/// );
///
/// let bytes = codec.encode(&env).unwrap();
/// let decoded: Envelope<Request> = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, env);
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

    fn is_textual(&self) -> bool {
        true
    }
}
