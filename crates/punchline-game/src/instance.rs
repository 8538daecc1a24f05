//! The per-session game state machine.
//!
//! An [`Instance`] holds everything about one session and enforces every
//! rule. It is plain synchronous data: no locks, no tasks, no clocks. The
//! session actor above it decides *when* methods are called (one at a
//! time); the instance decides *whether* they are allowed and what they do.

use std::collections::HashSet;

use punchline_protocol::{
    Answer, AnswerId, GamePhase, Player, PlayerId, Prompt, PromptId,
    PublicState, SessionCode,
};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info};

use crate::{GameConfig, GameError, PromptCorpus, Round};

/// Identifies the exact point a session is at: phase, round, and (while
/// voting) which prompt is under vote.
///
/// A deferred "advance" remembers the fingerprint it was scheduled for and
/// only fires if the instance still matches it; any other transition in
/// the meantime turns it into a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub phase: GamePhase,
    pub round: u32,
    /// Index into the round's prompts; 0 outside `VotingOnAnswers`.
    pub voting_prompt: usize,
}

/// One session's complete game state.
#[derive(Debug)]
pub struct Instance {
    code: SessionCode,
    config: GameConfig,
    corpus: PromptCorpus,
    rng: StdRng,
    players: Vec<Player>,
    phase: GamePhase,
    rounds: Vec<Round>,
    voting_prompt: usize,
    /// Corpus indices already drawn in this session.
    used_prompts: HashSet<usize>,
    next_player_id: u64,
    next_prompt_id: u64,
    next_answer_id: u64,
}

impl Instance {
    /// Creates a session waiting for players.
    ///
    /// `rng` drives prompt selection; seed it for reproducible games.
    pub fn new(
        code: SessionCode,
        corpus: PromptCorpus,
        config: GameConfig,
        rng: StdRng,
    ) -> Self {
        let players = Vec::with_capacity(config.max_players);
        Self {
            code,
            config,
            corpus,
            rng,
            players,
            phase: GamePhase::WaitingForPlayers,
            rounds: Vec::new(),
            voting_prompt: 0,
            used_prompts: HashSet::new(),
            next_player_id: 1,
            next_prompt_id: 1,
            next_answer_id: 1,
        }
    }

    // -- Accessors --------------------------------------------------------

    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    /// The round in play (the latest one).
    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    /// The prompt under vote, while voting.
    pub fn voting_prompt(&self) -> Option<&Prompt> {
        if self.phase != GamePhase::VotingOnAnswers {
            return None;
        }
        self.current_round()?.prompts().get(self.voting_prompt)
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            phase: self.phase,
            round: self.rounds.len() as u32,
            voting_prompt: if self.phase == GamePhase::VotingOnAnswers {
                self.voting_prompt
            } else {
                0
            },
        }
    }

    // -- Roster -----------------------------------------------------------

    /// Adds a player to the roster and returns their assigned id.
    ///
    /// Only `player.name` is used; the id comes from the session's counter
    /// and the score starts at zero.
    ///
    /// # Errors
    /// - [`GameError::PlayerLimitReached`] when the roster is full, in any
    ///   phase.
    /// - [`GameError::GameInProgress`] after the lobby.
    pub fn add_player(&mut self, player: Player) -> Result<PlayerId, GameError> {
        if self.players.len() >= self.config.max_players {
            return Err(GameError::PlayerLimitReached {
                max: self.config.max_players,
            });
        }
        self.ensure_phase(GamePhase::WaitingForPlayers)?;

        let id = PlayerId(self.next_player_id);
        self.next_player_id += 1;
        self.players.push(Player {
            id,
            name: player.name,
            score: 0,
        });

        info!(code = %self.code, player_id = %id, players = self.players.len(), "player joined");
        Ok(id)
    }

    /// Renames a player.
    pub fn update_player(&mut self, player: Player) -> Result<(), GameError> {
        self.ensure_phase(GamePhase::WaitingForPlayers)?;

        let existing = self
            .players
            .iter_mut()
            .find(|p| p.id == player.id)
            .ok_or(GameError::PlayerNotFound(player.id))?;
        existing.name = player.name;

        debug!(code = %self.code, player_id = %player.id, "player renamed");
        Ok(())
    }

    /// Removes a player, keeping the others in order. Ids are not reused.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<(), GameError> {
        self.ensure_phase(GamePhase::WaitingForPlayers)?;

        let index = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(GameError::PlayerNotFound(id))?;
        self.players.remove(index);

        info!(code = %self.code, player_id = %id, players = self.players.len(), "player left");
        Ok(())
    }

    // -- Phase transitions --------------------------------------------------

    /// Moves the game to its next phase.
    ///
    /// | from                | to                                                   |
    /// |---------------------|------------------------------------------------------|
    /// | `WaitingForPlayers` | `AnsweringPrompts` (round 1), if enough players      |
    /// | `AnsweringPrompts`  | `VotingOnAnswers` on the first answered prompt, or `ScoringRound` if nothing was answered |
    /// | `VotingOnAnswers`   | next answered prompt, or `ScoringRound` after the last (scores applied) |
    /// | `ScoringRound`      | `AnsweringPrompts` (next round) or `ScoringGame`     |
    /// | `ScoringGame`       | `Done`                                               |
    /// | `Done`              | stays `Done`                                         |
    ///
    /// # Errors
    /// [`GameError::PlayerMinimumNotMet`] when starting with
    /// `min_players` or fewer players.
    pub fn advance_state(&mut self) -> Result<(), GameError> {
        match self.phase {
            GamePhase::WaitingForPlayers => {
                if self.players.len() <= self.config.min_players {
                    return Err(GameError::PlayerMinimumNotMet {
                        min: self.config.min_players,
                        present: self.players.len(),
                    });
                }
                self.start_round();
            }
            GamePhase::AnsweringPrompts => self.open_voting_from(0),
            GamePhase::VotingOnAnswers => {
                self.open_voting_from(self.voting_prompt + 1)
            }
            GamePhase::ScoringRound => {
                if (self.rounds.len() as u32) < self.config.rounds {
                    self.start_round();
                } else {
                    self.enter(GamePhase::ScoringGame);
                }
            }
            GamePhase::ScoringGame => self.enter(GamePhase::Done),
            GamePhase::Done => {}
        }
        Ok(())
    }

    /// Builds the next round and opens answering.
    fn start_round(&mut self) {
        let texts = self.draw_prompt_texts(self.players.len());
        let prompts = texts
            .into_iter()
            .map(|text| {
                let id = PromptId(self.next_prompt_id);
                self.next_prompt_id += 1;
                Prompt { id, text }
            })
            .collect();

        let number = self.rounds.len() as u32 + 1;
        self.rounds.push(Round::new(
            number,
            &self.players,
            prompts,
            self.config.prompts_per_round,
        ));
        self.enter(GamePhase::AnsweringPrompts);
    }

    /// Picks `count` prompt texts at random, preferring ones this session
    /// has not seen yet. Repeats only when the corpus runs dry.
    fn draw_prompt_texts(&mut self, count: usize) -> Vec<String> {
        let total = self.corpus.len();
        let mut pool: Vec<usize> =
            (0..total).filter(|i| !self.used_prompts.contains(i)).collect();
        let mut picked: Vec<usize> = Vec::with_capacity(count);

        while picked.len() < count {
            if pool.is_empty() {
                pool = (0..total).filter(|i| !picked.contains(i)).collect();
                if pool.is_empty() {
                    pool = (0..total).collect();
                }
            }
            let slot = self.rng.random_range(0..pool.len());
            picked.push(pool.swap_remove(slot));
        }

        self.used_prompts.extend(picked.iter().copied());
        picked
            .into_iter()
            .filter_map(|i| self.corpus.get(i).map(str::to_string))
            .collect()
    }

    /// Opens voting on the first prompt at or after `start` that has at
    /// least one answer and at least one player who did not write one.
    /// With none left, the round is scored.
    fn open_voting_from(&mut self, start: usize) {
        let players = &self.players;
        let next = self.current_round().and_then(|round| {
            round
                .prompts()
                .iter()
                .enumerate()
                .skip(start)
                .find(|(_, p)| {
                    let answers = round.answers_to(p.id);
                    !answers.is_empty()
                        && players.iter().any(|player| {
                            answers.iter().all(|(author, _)| *author != player.id)
                        })
                })
                .map(|(i, _)| i)
        });

        match next {
            Some(index) => {
                self.voting_prompt = index;
                self.enter(GamePhase::VotingOnAnswers);
            }
            None => {
                self.score_round();
                self.voting_prompt = 0;
                self.enter(GamePhase::ScoringRound);
            }
        }
    }

    /// Applies the current round's points to the roster, once.
    fn score_round(&mut self) {
        let Some(round) = self.rounds.last_mut() else {
            return;
        };
        if round.is_scored() {
            return;
        }
        let earned =
            round.scores(self.config.points_per_vote, self.config.winner_bonus);
        round.mark_scored();

        for player in &mut self.players {
            if let Some(points) = earned.get(&player.id) {
                player.score += points;
            }
        }
        debug!(code = %self.code, round = self.rounds.len(), ?earned, "round scored");
    }

    fn enter(&mut self, phase: GamePhase) {
        self.phase = phase;
        info!(
            code = %self.code,
            phase = %phase,
            round = self.rounds.len(),
            "phase changed"
        );
    }

    fn ensure_phase(&self, expected: GamePhase) -> Result<(), GameError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GameError::GameInProgress(self.phase))
        }
    }

    fn ensure_player(&self, id: PlayerId) -> Result<(), GameError> {
        self.player(id)
            .map(|_| ())
            .ok_or(GameError::PlayerNotFound(id))
    }

    // -- Answering and voting -----------------------------------------------

    /// Records a player's answer to one of their assigned prompts and
    /// returns the new answer's id.
    ///
    /// When this was the last missing answer of the round, voting opens
    /// right away.
    ///
    /// # Errors
    /// `GameInProgress`, `PlayerNotFound`, `PromptNotFound` (not assigned
    /// to this player this round) or `AlreadyAnswered`.
    pub fn add_answer(
        &mut self,
        player_id: PlayerId,
        prompt_id: PromptId,
        text: impl Into<String>,
    ) -> Result<AnswerId, GameError> {
        self.ensure_phase(GamePhase::AnsweringPrompts)?;
        self.ensure_player(player_id)?;

        let answer_id = AnswerId(self.next_answer_id);
        let round = self
            .rounds
            .last_mut()
            .ok_or(GameError::PromptNotFound(prompt_id))?;
        let slot = round
            .assignment_mut(player_id, prompt_id)
            .ok_or(GameError::PromptNotFound(prompt_id))?;
        if slot.answer.is_some() {
            return Err(GameError::AlreadyAnswered(prompt_id));
        }

        slot.answer = Some(Answer {
            id: answer_id,
            text: text.into(),
        });
        self.next_answer_id += 1;
        let complete = round.is_fully_answered();

        debug!(code = %self.code, %player_id, %prompt_id, %answer_id, "answer submitted");

        if complete {
            self.open_voting_from(0);
        }
        Ok(answer_id)
    }

    /// Records a vote for an answer to the prompt under vote. Voting again
    /// on the same prompt replaces the earlier vote.
    ///
    /// When every eligible voter (everyone who did not answer this prompt)
    /// has voted, the next prompt opens right away.
    ///
    /// # Errors
    /// `GameInProgress`, `PlayerNotFound`, or `InvalidVoteTarget` if the
    /// answer isn't one of this prompt's answers or the voter wrote one of
    /// them.
    pub fn vote(
        &mut self,
        player_id: PlayerId,
        answer_id: AnswerId,
    ) -> Result<(), GameError> {
        self.ensure_phase(GamePhase::VotingOnAnswers)?;
        self.ensure_player(player_id)?;

        let voting_prompt = self.voting_prompt;
        let round = self
            .rounds
            .last_mut()
            .ok_or(GameError::InvalidVoteTarget(answer_id))?;
        let prompt_id = round
            .prompts()
            .get(voting_prompt)
            .map(|p| p.id)
            .ok_or(GameError::InvalidVoteTarget(answer_id))?;

        let (target_valid, authors) = {
            let answers = round.answers_to(prompt_id);
            let valid = answers.iter().any(|(_, a)| a.id == answer_id);
            let authors: Vec<PlayerId> =
                answers.iter().map(|(author, _)| *author).collect();
            (valid, authors)
        };
        if !target_valid || authors.contains(&player_id) {
            return Err(GameError::InvalidVoteTarget(answer_id));
        }

        round.record_vote(prompt_id, player_id, answer_id);
        debug!(code = %self.code, %player_id, %prompt_id, %answer_id, "vote recorded");

        let votes = round.votes_on(prompt_id);
        let complete = self
            .players
            .iter()
            .filter(|p| !authors.contains(&p.id))
            .all(|p| votes.is_some_and(|v| v.contains_key(&p.id)));

        if complete {
            self.open_voting_from(voting_prompt + 1);
        }
        Ok(())
    }

    // -- Projection -----------------------------------------------------------

    /// What `player_id` may see right now (`PlayerId(0)` for anyone).
    pub fn state(&self, player_id: PlayerId) -> PublicState {
        let mut state = PublicState {
            code: self.code.clone(),
            players: self.players.clone(),
            current_state: self.phase,
            round: self.rounds.len() as u32,
            prompt: None,
            answers: None,
            votes: None,
        };

        let Some(round) = self.current_round() else {
            return state;
        };

        match self.phase {
            GamePhase::AnsweringPrompts if !player_id.is_anonymous() => {
                state.prompt = round.next_unanswered(player_id).cloned();
            }
            GamePhase::VotingOnAnswers => {
                if let Some(prompt) = round.prompts().get(self.voting_prompt) {
                    state.answers = Some(
                        round
                            .answers_to(prompt.id)
                            .into_iter()
                            .map(|(_, a)| a.clone())
                            .collect(),
                    );
                    state.prompt = Some(prompt.clone());
                }
            }
            GamePhase::ScoringRound => {
                state.answers =
                    Some(round.all_answers().into_iter().cloned().collect());
                state.votes = Some(round.vote_counts());
            }
            _ => {}
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn corpus() -> PromptCorpus {
        PromptCorpus::new([
            "Worst thing to say at a wedding",
            "A terrible name for a boat",
            "The real reason dinosaurs died out",
            "Rejected superhero power",
            "Least popular ice cream flavor",
        ])
        .unwrap()
    }

    fn instance() -> Instance {
        Instance::new(
            SessionCode::from("TEST"),
            corpus(),
            GameConfig::untimed(),
            StdRng::seed_from_u64(7),
        )
    }

    fn with_players(n: usize) -> Instance {
        let mut inst = instance();
        for i in 0..n {
            inst.add_player(Player::named(format!("player{i}"))).unwrap();
        }
        inst
    }

    // =====================================================================
    // Roster
    // =====================================================================

    #[test]
    fn test_add_player_assigns_increasing_ids() {
        let mut inst = instance();
        let ids: Vec<PlayerId> = (0..5)
            .map(|i| inst.add_player(Player::named(format!("p{i}"))).unwrap())
            .collect();
        assert_eq!(ids, (1..=5).map(PlayerId).collect::<Vec<_>>());
    }

    #[test]
    fn test_add_player_ignores_client_id_and_score() {
        let mut inst = instance();
        let id = inst
            .add_player(Player {
                id: PlayerId(99),
                name: "Ada".into(),
                score: 1_000,
            })
            .unwrap();

        assert_eq!(id, PlayerId(1));
        assert_eq!(inst.player(id).unwrap().score, 0);
    }

    #[test]
    fn test_add_player_at_limit_fails() {
        let mut inst = with_players(8);
        let result = inst.add_player(Player::named("late"));
        assert_eq!(result, Err(GameError::PlayerLimitReached { max: 8 }));
        assert_eq!(inst.players().len(), 8);
    }

    #[test]
    fn test_add_player_after_start_fails() {
        let mut inst = with_players(4);
        inst.advance_state().unwrap();
        let result = inst.add_player(Player::named("late"));
        assert_eq!(
            result,
            Err(GameError::GameInProgress(GamePhase::AnsweringPrompts))
        );
    }

    #[test]
    fn test_ids_not_reused_after_remove() {
        let mut inst = with_players(2);
        inst.remove_player(PlayerId(2)).unwrap();
        let id = inst.add_player(Player::named("again")).unwrap();
        assert_eq!(id, PlayerId(3));
    }

    #[test]
    fn test_update_player_renames() {
        let mut inst = with_players(2);
        inst.update_player(Player {
            id: PlayerId(2),
            name: "Grace".into(),
            score: 500,
        })
        .unwrap();

        let player = inst.player(PlayerId(2)).unwrap();
        assert_eq!(player.name, "Grace");
        assert_eq!(player.score, 0, "score is not client-settable");
    }

    #[test]
    fn test_update_player_not_found() {
        let mut inst = with_players(1);
        let result = inst.update_player(Player {
            id: PlayerId(5),
            name: "ghost".into(),
            score: 0,
        });
        assert_eq!(result, Err(GameError::PlayerNotFound(PlayerId(5))));
    }

    #[test]
    fn test_remove_player_preserves_order() {
        let mut inst = with_players(4);
        inst.remove_player(PlayerId(2)).unwrap();

        let ids: Vec<u64> = inst.players().iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn test_remove_player_not_found() {
        let mut inst = with_players(1);
        assert_eq!(
            inst.remove_player(PlayerId(3)),
            Err(GameError::PlayerNotFound(PlayerId(3)))
        );
    }

    #[test]
    fn test_roster_frozen_after_start() {
        let mut inst = with_players(4);
        inst.advance_state().unwrap();

        assert!(matches!(
            inst.remove_player(PlayerId(1)),
            Err(GameError::GameInProgress(_))
        ));
        assert!(matches!(
            inst.update_player(Player {
                id: PlayerId(1),
                name: "x".into(),
                score: 0
            }),
            Err(GameError::GameInProgress(_))
        ));
    }

    // =====================================================================
    // Starting
    // =====================================================================

    #[test]
    fn test_start_with_min_players_fails() {
        let mut inst = with_players(3);
        assert_eq!(
            inst.advance_state(),
            Err(GameError::PlayerMinimumNotMet { min: 3, present: 3 })
        );
        assert_eq!(inst.phase(), GamePhase::WaitingForPlayers);
        assert!(inst.rounds().is_empty());
    }

    #[test]
    fn test_start_with_enough_players_creates_one_round() {
        let mut inst = with_players(4);
        inst.advance_state().unwrap();

        assert_eq!(inst.phase(), GamePhase::AnsweringPrompts);
        assert_eq!(inst.rounds().len(), 1);
        let round = inst.current_round().unwrap();
        assert_eq!(round.prompts().len(), 4);
        for player in inst.players() {
            assert_eq!(round.assignments(player.id).len(), 2);
        }
    }

    #[test]
    fn test_round_prompts_come_from_corpus_without_repeats() {
        let mut inst = with_players(4);
        inst.advance_state().unwrap();

        let corpus = corpus();
        let texts: Vec<&str> = inst
            .current_round()
            .unwrap()
            .prompts()
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        for text in &texts {
            assert!(corpus.iter().any(|c| c == *text));
        }
        let unique: HashSet<&&str> = texts.iter().collect();
        assert_eq!(unique.len(), texts.len());
    }

    #[test]
    fn test_prompts_repeat_when_corpus_smaller_than_round() {
        let mut inst = Instance::new(
            SessionCode::from("TINY"),
            PromptCorpus::new(["only one"]).unwrap(),
            GameConfig::untimed(),
            StdRng::seed_from_u64(1),
        );
        for i in 0..4 {
            inst.add_player(Player::named(format!("p{i}"))).unwrap();
        }
        inst.advance_state().unwrap();

        let round = inst.current_round().unwrap();
        assert_eq!(round.prompts().len(), 4);
        assert!(round.prompts().iter().all(|p| p.text == "only one"));
        let ids: HashSet<PromptId> = round.prompts().iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), 4, "prompt ids stay unique");
    }

    // =====================================================================
    // Answering
    // =====================================================================

    #[test]
    fn test_add_answer_outside_answering_fails() {
        let mut inst = with_players(4);
        assert_eq!(
            inst.add_answer(PlayerId(1), PromptId(1), "x"),
            Err(GameError::GameInProgress(GamePhase::WaitingForPlayers))
        );
    }

    #[test]
    fn test_add_answer_validates_player_prompt_and_duplicates() {
        let mut inst = with_players(4);
        inst.advance_state().unwrap();
        let round = inst.current_round().unwrap();
        let own = round.assignments(PlayerId(1))[0].prompt_id;
        let foreign = round
            .prompts()
            .iter()
            .map(|p| p.id)
            .find(|id| {
                round
                    .assignments(PlayerId(1))
                    .iter()
                    .all(|ua| ua.prompt_id != *id)
            })
            .unwrap();

        assert_eq!(
            inst.add_answer(PlayerId(9), own, "x"),
            Err(GameError::PlayerNotFound(PlayerId(9)))
        );
        assert_eq!(
            inst.add_answer(PlayerId(1), foreign, "x"),
            Err(GameError::PromptNotFound(foreign))
        );
        assert_eq!(inst.add_answer(PlayerId(1), own, "first"), Ok(AnswerId(1)));
        assert_eq!(
            inst.add_answer(PlayerId(1), own, "second"),
            Err(GameError::AlreadyAnswered(own))
        );
    }

    #[test]
    fn test_state_shows_next_unanswered_prompt() {
        let mut inst = with_players(4);
        inst.advance_state().unwrap();
        let assigned: Vec<PromptId> = inst
            .current_round()
            .unwrap()
            .assignments(PlayerId(2))
            .iter()
            .map(|ua| ua.prompt_id)
            .collect();

        assert_eq!(inst.state(PlayerId(2)).prompt.unwrap().id, assigned[0]);
        inst.add_answer(PlayerId(2), assigned[0], "ha").unwrap();
        assert_eq!(inst.state(PlayerId(2)).prompt.unwrap().id, assigned[1]);
        inst.add_answer(PlayerId(2), assigned[1], "ha ha").unwrap();
        assert!(inst.state(PlayerId(2)).prompt.is_none());

        assert!(inst.state(PlayerId::ANONYMOUS).prompt.is_none());
    }

    // =====================================================================
    // Projection
    // =====================================================================

    #[test]
    fn test_state_fresh_session() {
        let inst = instance();
        let state = inst.state(PlayerId::ANONYMOUS);
        assert_eq!(state.code.as_str(), "TEST");
        assert!(state.players.is_empty());
        assert_eq!(state.current_state, GamePhase::WaitingForPlayers);
        assert_eq!(state.round, 0);
        assert!(state.prompt.is_none());
        assert!(state.answers.is_none());
        assert!(state.votes.is_none());
    }

    // =====================================================================
    // Fingerprint
    // =====================================================================

    #[test]
    fn test_fingerprint_changes_with_every_transition() {
        let mut inst = with_players(4);
        let waiting = inst.fingerprint();
        inst.advance_state().unwrap();
        let answering = inst.fingerprint();

        assert_ne!(waiting, answering);
        assert_eq!(answering.phase, GamePhase::AnsweringPrompts);
        assert_eq!(answering.round, 1);
        assert_eq!(answering.voting_prompt, 0);
    }

    #[test]
    fn test_done_is_terminal() {
        let mut inst = with_players(4);
        // Nobody answers: each advance moves straight through.
        for _ in 0..8 {
            inst.advance_state().unwrap();
        }
        assert_eq!(inst.phase(), GamePhase::Done);
        let before = inst.fingerprint();
        inst.advance_state().unwrap();
        assert_eq!(inst.fingerprint(), before);
    }
}
