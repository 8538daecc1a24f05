//! Error types for the game rules.

use punchline_protocol::{AnswerId, GamePhase, PlayerId, PromptId};

/// A command that the game rules refuse.
///
/// Every variant is a client mistake or a race the client lost (e.g.
/// answering after the answer window closed). None of them leaves the
/// instance modified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The roster already holds the configured maximum.
    #[error("player limit reached ({max} players)")]
    PlayerLimitReached { max: usize },

    /// Starting needs more than `min_players` players.
    #[error("need more than {min} players to start, have {present}")]
    PlayerMinimumNotMet { min: usize, present: usize },

    /// The command is not allowed in the current phase.
    #[error("not allowed while the game is in {0}")]
    GameInProgress(GamePhase),

    /// No player with this id is on the roster.
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    /// The player already answered this prompt.
    #[error("prompt {0} already answered")]
    AlreadyAnswered(PromptId),

    /// The prompt is not one the player was assigned this round.
    #[error("prompt {0} not found")]
    PromptNotFound(PromptId),

    /// The answer is not a valid choice for this voter right now.
    #[error("cannot vote for answer {0}")]
    InvalidVoteTarget(AnswerId),

    /// A prompt corpus needs at least one non-blank prompt.
    #[error("prompt corpus is empty")]
    EmptyPromptCorpus,
}

impl GameError {
    /// Stable name of the variant, used as the error `kind` on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlayerLimitReached { .. } => "PlayerLimitReached",
            Self::PlayerMinimumNotMet { .. } => "PlayerMinimumNotMet",
            Self::GameInProgress(_) => "GameInProgress",
            Self::PlayerNotFound(_) => "PlayerNotFound",
            Self::AlreadyAnswered(_) => "AlreadyAnswered",
            Self::PromptNotFound(_) => "PromptNotFound",
            Self::InvalidVoteTarget(_) => "InvalidVoteTarget",
            Self::EmptyPromptCorpus => "EmptyPromptCorpus",
        }
    }
}
