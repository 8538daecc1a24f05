//! Commands clients send against a session.
//!
//! A command is a flat record: a `type` tag plus whichever optional fields
//! that type needs. Which fields are required is decided by the session
//! actor, not by deserialization, so a command missing its payload still
//! parses and is rejected with a precise "missing field" error.

use serde::{Deserialize, Serialize};

use crate::{Answer, Player, PlayerId, PromptId};

/// What a [`Command`] asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CommandKind {
    /// Read the state without changing anything.
    GetState,
    /// Join the roster. Needs `player` (only its name is used).
    AddPlayer,
    /// Rename a player. Needs `player` with `id` and the new `name`.
    UpdatePlayer,
    /// Leave the roster. Needs `player.id` or `playerId`.
    RemovePlayer,
    /// Start the game (advance out of the lobby).
    StartGame,
    /// Answer an assigned prompt. Needs `playerId`, `promptId`, `answer`.
    AnswerPrompt,
    /// Vote for an answer to the prompt under vote. Needs `playerId` and
    /// `answer.id`.
    Vote,
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// A command against one session.
///
/// ```rust
/// use punchline_protocol::{Command, CommandKind};
///
/// let cmd: Command = serde_json::from_str(
///     r#"{"type":"AddPlayer","player":{"name":"Ada"}}"#,
/// ).unwrap();
/// assert_eq!(cmd.kind, CommandKind::AddPlayer);
/// assert_eq!(cmd.player.unwrap().name, "Ada");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    #[serde(rename = "type")]
    pub kind: CommandKind,

    /// The acting player; also selects whose view the reply projects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<Player>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<PromptId>,

    /// Answer text for `AnswerPrompt`, vote target for `Vote`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Answer>,
}

impl Command {
    /// A command of the given kind with no payload.
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            player_id: None,
            player: None,
            prompt_id: None,
            answer: None,
        }
    }

    pub fn get_state(player_id: PlayerId) -> Self {
        Self::new(CommandKind::GetState).by(player_id)
    }

    pub fn add_player(name: impl Into<String>) -> Self {
        Self {
            player: Some(Player::named(name)),
            ..Self::new(CommandKind::AddPlayer)
        }
    }

    pub fn update_player(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            player: Some(Player {
                id,
                name: name.into(),
                score: 0,
            }),
            ..Self::new(CommandKind::UpdatePlayer)
        }
        .by(id)
    }

    pub fn remove_player(id: PlayerId) -> Self {
        Self::new(CommandKind::RemovePlayer).by(id)
    }

    pub fn start_game() -> Self {
        Self::new(CommandKind::StartGame)
    }

    pub fn answer_prompt(
        player_id: PlayerId,
        prompt_id: PromptId,
        text: impl Into<String>,
    ) -> Self {
        Self {
            prompt_id: Some(prompt_id),
            answer: Some(Answer::text(text)),
            ..Self::new(CommandKind::AnswerPrompt)
        }
        .by(player_id)
    }

    pub fn vote(player_id: PlayerId, answer_id: crate::AnswerId) -> Self {
        Self {
            answer: Some(Answer::target(answer_id)),
            ..Self::new(CommandKind::Vote)
        }
        .by(player_id)
    }

    /// Sets the acting player.
    pub fn by(mut self, player_id: PlayerId) -> Self {
        self.player_id = Some(player_id);
        self
    }

    /// The player whose view the reply should project (anonymous if unset).
    pub fn viewer(&self) -> PlayerId {
        self.player_id.unwrap_or(PlayerId::ANONYMOUS)
    }
}
