//! Error types for the session layer.

use punchline_game::GameError;
use punchline_protocol::SessionCode;

/// Errors from session operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No session is registered under this code.
    #[error("session {0} not found")]
    SessionNotFound(SessionCode),

    /// The command lacks a field its type requires.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The game rules refused the command.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Every generated code collided with an existing session.
    #[error("no free session code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: usize },

    /// The code generator could not be seeded.
    #[error("entropy source failed: {0}")]
    Entropy(String),

    /// The session's actor is gone or not accepting commands.
    #[error("session {0} is unavailable")]
    Unavailable(SessionCode),
}

impl SessionError {
    /// Stable name of the variant, used as the error `kind` on the wire.
    /// Game errors report their own kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "SessionNotFound",
            Self::MissingField(_) => "MissingField",
            Self::Game(err) => err.kind(),
            Self::CodeSpaceExhausted { .. } => "CodeSpaceExhausted",
            Self::Entropy(_) => "Entropy",
            Self::Unavailable(_) => "Unavailable",
        }
    }
}
