//! Unified error type for the Punchline server.

use std::path::PathBuf;

use punchline_game::GameError;
use punchline_protocol::ProtocolError;
use punchline_session::SessionError;
use punchline_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` conversions let `?` lift sub-crate errors directly.
#[derive(Debug, thiserror::Error)]
pub enum PunchlineError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (not found, missing field, code space).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A game rule or setup error (e.g. an empty prompt corpus).
    #[error(transparent)]
    Game(#[from] GameError),

    /// The prompt file could not be read.
    #[error("cannot read prompt file {path}: {source}")]
    PromptFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An environment setting has an unusable value.
    #[error("invalid configuration: {0}")]
    Config(String),
}
