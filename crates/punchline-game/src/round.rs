//! One round of play: its prompts, who must answer which, what they
//! answered, and who voted for what.

use std::collections::BTreeMap;

use punchline_protocol::{Answer, AnswerId, Player, PlayerId, Prompt, PromptId};

/// A prompt assigned to a player, and their answer once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAnswer {
    pub player_id: PlayerId,
    pub prompt_id: PromptId,
    /// `None` until the player answers.
    pub answer: Option<Answer>,
}

/// Vote outcome for one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTally {
    pub prompt_id: PromptId,
    /// Votes per answer, including answers nobody voted for.
    pub counts: BTreeMap<AnswerId, u64>,
    /// Most-voted answer; ties go to the lowest answer id. `None` when
    /// nobody voted.
    pub winner: Option<AnswerId>,
}

/// A round's prompts, assignments and votes.
///
/// Prompts and the prompt side of each assignment are fixed when the round
/// is built; afterwards only answer slots (once each) and votes change.
#[derive(Debug, Clone)]
pub struct Round {
    number: u32,
    prompts: Vec<Prompt>,
    assignments: BTreeMap<PlayerId, Vec<UserAnswer>>,
    /// prompt → (voter → chosen answer)
    votes: BTreeMap<PromptId, BTreeMap<PlayerId, AnswerId>>,
    scored: bool,
}

impl Round {
    /// Builds a round with one prompt per player, assigned in a circle:
    /// the player at roster position `j` gets prompts `j, j+1, …,
    /// j+per_player-1` (mod player count). Every prompt thus goes to
    /// `per_player` different players.
    ///
    /// `prompts.len()` must equal `players.len()` and `per_player` must
    /// not exceed it; the instance guarantees both.
    pub(crate) fn new(
        number: u32,
        players: &[Player],
        prompts: Vec<Prompt>,
        per_player: usize,
    ) -> Self {
        let n = prompts.len();
        let assignments = players
            .iter()
            .enumerate()
            .map(|(j, player)| {
                let assigned = (0..per_player)
                    .map(|k| UserAnswer {
                        player_id: player.id,
                        prompt_id: prompts[(j + k) % n].id,
                        answer: None,
                    })
                    .collect();
                (player.id, assigned)
            })
            .collect();

        Self {
            number,
            prompts,
            assignments,
            votes: BTreeMap::new(),
            scored: false,
        }
    }

    /// 1-based round number.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn prompt(&self, id: PromptId) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.id == id)
    }

    /// The player's assignments, in the order they should answer them.
    pub fn assignments(&self, player_id: PlayerId) -> &[UserAnswer] {
        self.assignments
            .get(&player_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All assignments of all players.
    pub fn all_assignments(&self) -> impl Iterator<Item = &UserAnswer> {
        self.assignments.values().flatten()
    }

    /// First prompt the player has not answered yet.
    pub fn next_unanswered(&self, player_id: PlayerId) -> Option<&Prompt> {
        self.assignments(player_id)
            .iter()
            .find(|ua| ua.answer.is_none())
            .and_then(|ua| self.prompt(ua.prompt_id))
    }

    pub(crate) fn assignment_mut(
        &mut self,
        player_id: PlayerId,
        prompt_id: PromptId,
    ) -> Option<&mut UserAnswer> {
        self.assignments
            .get_mut(&player_id)?
            .iter_mut()
            .find(|ua| ua.prompt_id == prompt_id)
    }

    /// Returns `true` once every assignment holds an answer.
    pub fn is_fully_answered(&self) -> bool {
        self.all_assignments().all(|ua| ua.answer.is_some())
    }

    /// Submitted answers to a prompt with their authors, by answer id.
    pub fn answers_to(&self, prompt_id: PromptId) -> Vec<(PlayerId, &Answer)> {
        let mut answers: Vec<(PlayerId, &Answer)> = self
            .all_assignments()
            .filter(|ua| ua.prompt_id == prompt_id)
            .filter_map(|ua| ua.answer.as_ref().map(|a| (ua.player_id, a)))
            .collect();
        answers.sort_by_key(|(_, a)| a.id);
        answers
    }

    /// Every submitted answer of the round, by answer id.
    pub fn all_answers(&self) -> Vec<&Answer> {
        let mut answers: Vec<&Answer> = self
            .all_assignments()
            .filter_map(|ua| ua.answer.as_ref())
            .collect();
        answers.sort_by_key(|a| a.id);
        answers
    }

    /// Who wrote the given answer.
    pub fn author_of(&self, answer_id: AnswerId) -> Option<PlayerId> {
        self.all_assignments()
            .find(|ua| ua.answer.as_ref().is_some_and(|a| a.id == answer_id))
            .map(|ua| ua.player_id)
    }

    /// Records (or replaces) a player's vote on a prompt.
    pub(crate) fn record_vote(
        &mut self,
        prompt_id: PromptId,
        voter: PlayerId,
        answer_id: AnswerId,
    ) {
        self.votes
            .entry(prompt_id)
            .or_default()
            .insert(voter, answer_id);
    }

    /// Votes cast on a prompt, voter → answer.
    pub fn votes_on(&self, prompt_id: PromptId) -> Option<&BTreeMap<PlayerId, AnswerId>> {
        self.votes.get(&prompt_id)
    }

    /// Counts the votes on one prompt and picks its winner.
    pub fn tally(&self, prompt_id: PromptId) -> PromptTally {
        let mut counts: BTreeMap<AnswerId, u64> = self
            .answers_to(prompt_id)
            .into_iter()
            .map(|(_, a)| (a.id, 0))
            .collect();

        if let Some(votes) = self.votes.get(&prompt_id) {
            for answer_id in votes.values() {
                *counts.entry(*answer_id).or_default() += 1;
            }
        }

        // BTreeMap iterates in ascending id order, so keeping the first
        // strictly-greater count resolves ties to the lowest id.
        let mut winner: Option<(AnswerId, u64)> = None;
        for (&id, &count) in &counts {
            if count > 0 && winner.is_none_or(|(_, best)| count > best) {
                winner = Some((id, count));
            }
        }

        PromptTally {
            prompt_id,
            counts,
            winner: winner.map(|(id, _)| id),
        }
    }

    /// Vote counts for every answer of the round.
    pub fn vote_counts(&self) -> BTreeMap<AnswerId, u64> {
        self.prompts
            .iter()
            .flat_map(|p| self.tally(p.id).counts)
            .collect()
    }

    /// Points earned this round per author.
    pub fn scores(
        &self,
        points_per_vote: i64,
        winner_bonus: i64,
    ) -> BTreeMap<PlayerId, i64> {
        let mut scores = BTreeMap::new();
        for prompt in &self.prompts {
            let tally = self.tally(prompt.id);
            for (&answer_id, &count) in &tally.counts {
                if let Some(author) = self.author_of(answer_id) {
                    *scores.entry(author).or_insert(0) +=
                        points_per_vote * count as i64;
                }
            }
            if let Some(author) = tally.winner.and_then(|w| self.author_of(w)) {
                *scores.entry(author).or_insert(0) += winner_bonus;
            }
        }
        scores
    }

    pub fn is_scored(&self) -> bool {
        self.scored
    }

    pub(crate) fn mark_scored(&mut self) {
        self.scored = true;
    }
}
