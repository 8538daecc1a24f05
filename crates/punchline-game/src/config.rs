//! Game configuration.

use std::time::Duration;

use punchline_protocol::GamePhase;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Rules and timings shared by every session a manager creates.
///
/// Construct with `GameConfig::default()` and override the fields you
/// care about; the manager runs the result through
/// [`validated`](Self::validated) before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Length of generated session codes.
    pub code_length: usize,

    /// Starting requires strictly more players than this.
    pub min_players: usize,

    /// Maximum roster size.
    pub max_players: usize,

    /// Rounds per game.
    pub rounds: u32,

    /// Prompts each player must answer per round.
    pub prompts_per_round: usize,

    /// Points an answer's author earns per vote received.
    pub points_per_vote: i64,

    /// Extra points for the top-voted answer to each prompt.
    pub winner_bonus: i64,

    /// How long players get to answer before voting opens anyway.
    /// `None` waits for every answer.
    pub answer_time: Option<Duration>,

    /// How long each prompt stays open for votes.
    pub vote_time: Option<Duration>,

    /// How long round results are shown before the next round.
    pub scoring_time: Option<Duration>,

    /// How long final results are shown before the game is done.
    pub final_scoring_time: Option<Duration>,

    /// Capacity of each session actor's command queue. Callers wait when
    /// it is full.
    pub mailbox_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            code_length: 4,
            min_players: 3,
            max_players: 8,
            rounds: 2,
            prompts_per_round: 2,
            points_per_vote: 100,
            winner_bonus: 50,
            answer_time: Some(Duration::from_secs(60)),
            vote_time: Some(Duration::from_secs(20)),
            scoring_time: Some(Duration::from_secs(10)),
            final_scoring_time: Some(Duration::from_secs(10)),
            mailbox_size: 64,
        }
    }
}

impl GameConfig {
    /// Longest supported session code.
    pub const MAX_CODE_LENGTH: usize = 16;

    /// Clamp any out-of-range values so the config is safe to use.
    ///
    /// Rules:
    /// - `code_length` in `1..=MAX_CODE_LENGTH`.
    /// - `max_players` > `min_players` (otherwise no game could start).
    /// - `prompts_per_round` in `1..=min_players + 1`, so every player of
    ///   a started game answers distinct prompts.
    /// - `rounds` and `mailbox_size` at least 1.
    pub fn validated(mut self) -> Self {
        if self.code_length == 0 || self.code_length > Self::MAX_CODE_LENGTH {
            let clamped = self.code_length.clamp(1, Self::MAX_CODE_LENGTH);
            warn!(
                code_length = self.code_length,
                clamped, "code_length out of range, clamping"
            );
            self.code_length = clamped;
        }
        if self.max_players <= self.min_players {
            warn!(
                min = self.min_players,
                max = self.max_players,
                "max_players must exceed min_players, raising max_players"
            );
            self.max_players = self.min_players + 1;
        }
        let ppr_cap = self.min_players + 1;
        if self.prompts_per_round == 0 || self.prompts_per_round > ppr_cap {
            let clamped = self.prompts_per_round.clamp(1, ppr_cap);
            warn!(
                prompts_per_round = self.prompts_per_round,
                clamped, "prompts_per_round out of range, clamping"
            );
            self.prompts_per_round = clamped;
        }
        self.rounds = self.rounds.max(1);
        self.mailbox_size = self.mailbox_size.max(1);
        self
    }

    /// How long the given phase lasts before it is advanced automatically.
    ///
    /// `None` for phases that only players end (`WaitingForPlayers`), the
    /// terminal phase, and phases whose timer is disabled.
    pub fn phase_time(&self, phase: GamePhase) -> Option<Duration> {
        match phase {
            GamePhase::AnsweringPrompts => self.answer_time,
            GamePhase::VotingOnAnswers => self.vote_time,
            GamePhase::ScoringRound => self.scoring_time,
            GamePhase::ScoringGame => self.final_scoring_time,
            GamePhase::WaitingForPlayers | GamePhase::Done => None,
        }
    }

    /// A config with every phase timer disabled, for driving games by hand.
    pub fn untimed() -> Self {
        Self {
            answer_time: None,
            vote_time: None,
            scoring_time: None,
            final_scoring_time: None,
            ..Self::default()
        }
    }
}
