//! Core public types shared by every layer: identifiers, players, prompts,
//! answers and the phase a session is in.
//!
//! Everything here is what clients see. Internal bookkeeping (which player
//! answered what, who voted for whom) stays inside the game crate and only
//! leaks out through [`PublicState`](crate::PublicState).

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifier of a player within one session.
///
/// Ids are handed out by the session, starting at 1 and never reused.
/// `PlayerId(0)` is the anonymous caller: asking for state as player 0
/// yields the shared view with no personal prompt.
///
/// `#[serde(transparent)]` keeps the wire form a bare number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
    Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// The anonymous caller.
    pub const ANONYMOUS: Self = Self(0);

    /// Returns `true` for [`PlayerId::ANONYMOUS`].
    pub fn is_anonymous(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Identifier of a prompt, unique within a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
    Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PromptId(pub u64);

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q-{}", self.0)
    }
}

/// Identifier of a submitted answer, unique within a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
    Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AnswerId(pub u64);

impl fmt::Display for AnswerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

/// The short code players type in to join a session (e.g. `"QXZT"`).
///
/// Codes are case-sensitive: `"qxzt"` is a different (and never issued)
/// code.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionCode(String);

impl SessionCode {
    /// Wraps a code string as-is.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Borrows the code text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

// ---------------------------------------------------------------------------
// Roster and content
// ---------------------------------------------------------------------------

/// A player on a session's roster.
///
/// On `AddPlayer` only `name` is taken from the client; the session
/// assigns `id` and starts `score` at zero. Missing fields default so a
/// client may send just `{"name": "Ada"}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: i64,
}

impl Player {
    /// A not-yet-registered player carrying only a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A question players write answers for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: PromptId,
    pub text: String,
}

/// A player's answer to a prompt.
///
/// Also used as the vote target on the wire, where only `id` matters, so
/// `text` defaults to empty when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub id: AnswerId,
    #[serde(default)]
    pub text: String,
}

impl Answer {
    /// An answer payload carrying only text (what clients send).
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            id: AnswerId::default(),
            text: text.into(),
        }
    }

    /// A vote target payload carrying only the answer id.
    pub fn target(id: AnswerId) -> Self {
        Self {
            id,
            text: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// GamePhase
// ---------------------------------------------------------------------------

/// The phase a session is in.
///
/// Phases only ever move forward:
///
/// ```text
///   WaitingForPlayers → AnsweringPrompts → VotingOnAnswers → ScoringRound
///                             ↑                                    │
///                             └──────────(more rounds)─────────────┤
///                                                                  ▼
///                                                Done ← ScoringGame
/// ```
///
/// `VotingOnAnswers` is entered once per round but covers every prompt of
/// the round in turn; which prompt is under vote is tracked separately.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
    Serialize, Deserialize,
)]
#[serde(rename_all = "PascalCase")]
pub enum GamePhase {
    #[default]
    WaitingForPlayers,
    AnsweringPrompts,
    VotingOnAnswers,
    ScoringRound,
    ScoringGame,
    Done,
}

impl GamePhase {
    /// Returns `true` while the roster may still change.
    pub fn is_lobby(self) -> bool {
        matches!(self, Self::WaitingForPlayers)
    }

    /// Returns `true` once the game has ended.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WaitingForPlayers => "WaitingForPlayers",
            Self::AnsweringPrompts => "AnsweringPrompts",
            Self::VotingOnAnswers => "VotingOnAnswers",
            Self::ScoringRound => "ScoringRound",
            Self::ScoringGame => "ScoringGame",
            Self::Done => "Done",
        };
        f.write_str(name)
    }
}
