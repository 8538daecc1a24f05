//! The public projection of a session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Answer, AnswerId, GamePhase, Player, Prompt, SessionCode};

/// What a given (or anonymous) player is allowed to see of a session.
///
/// Which optional parts are present depends on the phase:
///
/// | phase              | `prompt`                    | `answers`            | `votes`           |
/// |--------------------|-----------------------------|----------------------|-------------------|
/// | `AnsweringPrompts` | caller's next unanswered one | –                   | –                 |
/// | `VotingOnAnswers`  | the prompt under vote       | answers to it        | –                 |
/// | `ScoringRound`     | –                           | all of the round's   | per-answer counts |
///
/// Everything else carries only the roster and phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicState {
    pub code: SessionCode,
    pub players: Vec<Player>,
    pub current_state: GamePhase,

    /// Number of the round in play (0 before the game starts).
    #[serde(default)]
    pub round: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Prompt>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<Answer>>,

    /// Vote count per answer. Serialized as a JSON object keyed by the
    /// answer id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<BTreeMap<AnswerId, u64>>,
}

impl PublicState {
    /// Looks up a player on the roster by id.
    pub fn player(&self, id: crate::PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }
}
