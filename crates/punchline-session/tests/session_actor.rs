//! Integration tests for session actors, timers and the session manager.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use punchline_game::{GameConfig, GameError, PromptCorpus};
use punchline_protocol::{
    Command, CommandKind, GamePhase, PlayerId, PublicState, SessionCode,
};
use punchline_session::{
    CodeGenerator, CodeSource, MAX_CODE_ATTEMPTS, SessionError, SessionHandle,
    SessionManager,
};

// =========================================================================
// Helpers
// =========================================================================

fn corpus() -> PromptCorpus {
    PromptCorpus::from_lines(
        "Worst thing to yell in a library\n\
         A bad name for a pet rock\n\
         What aliens think of us\n\
         A terrible theme park ride\n\
         The secret ingredient in grandma's soup\n\
         What the cat is plotting\n\
         A useless kitchen gadget\n\
         Rejected fortune cookie message\n",
    )
    .unwrap()
}

fn manager(config: GameConfig) -> Arc<SessionManager> {
    Arc::new(SessionManager::with_code_source(
        config,
        corpus(),
        CodeGenerator::seeded(11),
    ))
}

/// A code source that plays back a fixed list, repeating the last code.
struct ScriptedCodes {
    codes: VecDeque<&'static str>,
    last: &'static str,
}

impl ScriptedCodes {
    fn new(codes: &[&'static str]) -> Self {
        Self {
            codes: codes.iter().copied().collect(),
            last: codes[codes.len() - 1],
        }
    }
}

impl CodeSource for ScriptedCodes {
    fn next_code(&mut self, _length: usize) -> Result<SessionCode, SessionError> {
        let code = self.codes.pop_front().unwrap_or(self.last);
        Ok(SessionCode::from(code))
    }
}

async fn new_session(manager: &SessionManager) -> SessionHandle {
    let state = manager.create_session().await.unwrap();
    manager.lookup(&state.code).unwrap()
}

async fn add_players(handle: &SessionHandle, n: usize) -> Vec<PlayerId> {
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let state = handle
            .execute(Command::add_player(format!("player{i}")))
            .await
            .unwrap();
        ids.push(state.players.last().unwrap().id);
    }
    ids
}

/// Answers every outstanding prompt of every player.
async fn answer_everything(handle: &SessionHandle, ids: &[PlayerId]) -> PublicState {
    for &id in ids {
        loop {
            let state = handle.query(id).await.unwrap();
            if state.current_state != GamePhase::AnsweringPrompts {
                return state;
            }
            let Some(prompt) = state.prompt else { break };
            handle
                .execute(Command::answer_prompt(id, prompt.id, "a punchline"))
                .await
                .unwrap();
        }
    }
    handle.query(PlayerId::ANONYMOUS).await.unwrap()
}

// =========================================================================
// Commands through the actor
// =========================================================================

#[tokio::test]
async fn test_new_session_starts_empty() {
    let manager = manager(GameConfig::untimed());
    let state = manager.create_session().await.unwrap();

    assert_eq!(state.current_state, GamePhase::WaitingForPlayers);
    assert!(state.players.is_empty());
    assert!(state.prompt.is_none());
    assert_eq!(state.code.as_str().len(), 4);
}

#[tokio::test]
async fn test_add_player_returns_new_players_view() {
    let manager = manager(GameConfig::untimed());
    let handle = new_session(&manager).await;

    let state = handle.execute(Command::add_player("Ada")).await.unwrap();
    assert_eq!(state.players.len(), 1);
    assert_eq!(state.players[0].id, PlayerId(1));
    assert_eq!(state.players[0].name, "Ada");
}

#[tokio::test]
async fn test_missing_fields_rejected_before_instance() {
    let manager = manager(GameConfig::untimed());
    let handle = new_session(&manager).await;

    let err = handle
        .execute(Command::new(CommandKind::AddPlayer))
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::MissingField("player"));

    let err = handle
        .execute(Command::new(CommandKind::AnswerPrompt))
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::MissingField("playerId"));

    let err = handle
        .execute(Command::new(CommandKind::Vote).by(PlayerId(1)))
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::MissingField("answer.id"));

    let err = handle
        .execute(Command::new(CommandKind::RemovePlayer))
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::MissingField("playerId"));

    let state = handle.query(PlayerId::ANONYMOUS).await.unwrap();
    assert!(state.players.is_empty());
}

#[tokio::test]
async fn test_game_errors_pass_through() {
    let manager = manager(GameConfig::untimed());
    let handle = new_session(&manager).await;
    add_players(&handle, 3).await;

    let err = handle.execute(Command::start_game()).await.unwrap_err();
    assert_eq!(
        err,
        SessionError::Game(GameError::PlayerMinimumNotMet { min: 3, present: 3 })
    );
    assert_eq!(err.kind(), "PlayerMinimumNotMet");
}

#[tokio::test]
async fn test_start_game_shows_each_player_a_prompt() {
    let manager = manager(GameConfig::untimed());
    let handle = new_session(&manager).await;
    let ids = add_players(&handle, 4).await;

    let state = handle.execute(Command::start_game()).await.unwrap();
    assert_eq!(state.current_state, GamePhase::AnsweringPrompts);
    assert!(state.prompt.is_none(), "anonymous caller sees no prompt");

    for id in ids {
        let view = handle.query(id).await.unwrap();
        assert!(view.prompt.is_some());
    }
}

#[tokio::test]
async fn test_remove_player_by_player_id() {
    let manager = manager(GameConfig::untimed());
    let handle = new_session(&manager).await;
    add_players(&handle, 3).await;

    let state = handle
        .execute(Command::remove_player(PlayerId(2)))
        .await
        .unwrap();
    let ids: Vec<PlayerId> = state.players.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![PlayerId(1), PlayerId(3)]);
}

#[tokio::test]
async fn test_unknown_session_not_found() {
    let manager = manager(GameConfig::untimed());
    let code = SessionCode::from("ZZZZ");

    let err = manager
        .execute(&code, Command::start_game())
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::SessionNotFound(code.clone()));
    assert_eq!(err.kind(), "SessionNotFound");

    let err = manager
        .get_state(&code, PlayerId::ANONYMOUS)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::SessionNotFound(_)));
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_add_player_is_linearizable() {
    let manager = manager(GameConfig::untimed());
    let handle = new_session(&manager).await;

    let mut tasks = Vec::new();
    for i in 0..50 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            handle.execute(Command::add_player(format!("racer{i}"))).await
        }));
    }

    let mut joined = HashSet::new();
    let mut rejected = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(state) => {
                // The reply is the view of the player just added: the last
                // one in the roster at that moment.
                let id = state.players.last().unwrap().id;
                assert!(joined.insert(id), "duplicate id {id}");
            }
            Err(SessionError::Game(GameError::PlayerLimitReached { max: 8 })) => {
                rejected += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(joined.len(), 8);
    assert_eq!(rejected, 42);
    let expected: HashSet<PlayerId> = (1..=8).map(PlayerId).collect();
    assert_eq!(joined, expected);

    let state = handle.query(PlayerId::ANONYMOUS).await.unwrap();
    assert_eq!(state.players.len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_session_codes_are_unique() {
    let manager = manager(GameConfig::untimed());

    let mut tasks = Vec::new();
    for _ in 0..100 {
        let manager = Arc::clone(&manager);
        tasks.push(tokio::spawn(async move { manager.create_session().await }));
    }

    let mut codes = HashSet::new();
    for task in tasks {
        let state = task.await.unwrap().unwrap();
        assert!(codes.insert(state.code));
    }
    assert_eq!(manager.session_count(), 100);
}

#[tokio::test]
async fn test_create_session_retries_on_collision() {
    let manager = SessionManager::with_code_source(
        GameConfig::untimed(),
        corpus(),
        ScriptedCodes::new(&["AAAA", "AAAA", "AAAA", "BBBB"]),
    );

    let first = manager.create_session().await.unwrap();
    let second = manager.create_session().await.unwrap();

    assert_eq!(first.code.as_str(), "AAAA");
    assert_eq!(second.code.as_str(), "BBBB");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_create_session_returns_pristine_state() {
    let manager = Arc::new(SessionManager::with_code_source(
        GameConfig::untimed(),
        corpus(),
        ScriptedCodes::new(&["RACE"]),
    ));
    let code = SessionCode::from("RACE");

    // Joins the session the moment its code resolves.
    let joiner = {
        let manager = Arc::clone(&manager);
        let code = code.clone();
        tokio::spawn(async move {
            loop {
                match manager.execute(&code, Command::add_player("eager")).await {
                    Err(SessionError::SessionNotFound(_)) => tokio::task::yield_now().await,
                    other => return other,
                }
            }
        })
    };

    let created = manager.create_session().await.unwrap();
    assert_eq!(created.code, code);
    assert!(created.players.is_empty());
    assert_eq!(created.current_state, GamePhase::WaitingForPlayers);

    let joined = joiner.await.unwrap().unwrap();
    assert_eq!(joined.players.len(), 1);
}

#[tokio::test]
async fn test_create_session_gives_up_when_codes_exhausted() {
    let manager = SessionManager::with_code_source(
        GameConfig::untimed(),
        corpus(),
        ScriptedCodes::new(&["AAAA"]),
    );

    manager.create_session().await.unwrap();
    let err = manager.create_session().await.unwrap_err();
    assert_eq!(
        err,
        SessionError::CodeSpaceExhausted {
            attempts: MAX_CODE_ATTEMPTS
        }
    );
    assert_eq!(manager.session_count(), 1);
}

// =========================================================================
// Deferred advances and timers
// =========================================================================

#[tokio::test]
async fn test_stale_advance_is_noop() {
    let manager = manager(GameConfig::untimed());
    let handle = new_session(&manager).await;
    let ids = add_players(&handle, 4).await;
    handle.execute(Command::start_game()).await.unwrap();

    let answering = handle.fingerprint().await.unwrap();
    let state = answer_everything(&handle, &ids).await;
    assert_eq!(state.current_state, GamePhase::VotingOnAnswers);

    let before = handle.fingerprint().await.unwrap();
    assert!(!handle.advance_if(answering).await.unwrap());
    assert_eq!(handle.fingerprint().await.unwrap(), before);
}

#[tokio::test]
async fn test_matching_advance_fires() {
    let manager = manager(GameConfig::untimed());
    let handle = new_session(&manager).await;
    add_players(&handle, 4).await;
    handle.execute(Command::start_game()).await.unwrap();

    let answering = handle.fingerprint().await.unwrap();
    assert!(handle.advance_if(answering).await.unwrap());

    let state = handle.query(PlayerId::ANONYMOUS).await.unwrap();
    assert_eq!(state.current_state, GamePhase::ScoringRound);
}

#[tokio::test(start_paused = true)]
async fn test_answer_timer_advances_phase() {
    let manager = manager(GameConfig::default());
    let handle = new_session(&manager).await;
    add_players(&handle, 4).await;
    handle.execute(Command::start_game()).await.unwrap();

    tokio::time::sleep(Duration::from_secs(59)).await;
    let state = handle.query(PlayerId::ANONYMOUS).await.unwrap();
    assert_eq!(state.current_state, GamePhase::AnsweringPrompts);

    // Nobody answered, so the timeout skips voting.
    tokio::time::sleep(Duration::from_secs(2)).await;
    let state = handle.query(PlayerId::ANONYMOUS).await.unwrap();
    assert_eq!(state.current_state, GamePhase::ScoringRound);

    // The scoring timer then opens round two.
    tokio::time::sleep(Duration::from_secs(10)).await;
    let state = handle.query(PlayerId::ANONYMOUS).await.unwrap();
    assert_eq!(state.current_state, GamePhase::AnsweringPrompts);
    assert_eq!(state.round, 2);
}

#[tokio::test(start_paused = true)]
async fn test_timers_run_game_to_done() {
    let manager = manager(GameConfig::default());
    let handle = new_session(&manager).await;
    add_players(&handle, 4).await;
    handle.execute(Command::start_game()).await.unwrap();

    // Two rounds of (answer 60 s + scoring 10 s), then final scoring 10 s.
    tokio::time::sleep(Duration::from_secs(60 + 10 + 60 + 10 + 10 + 1)).await;
    let state = handle.query(PlayerId::ANONYMOUS).await.unwrap();
    assert_eq!(state.current_state, GamePhase::Done);
}

#[tokio::test(start_paused = true)]
async fn test_early_completion_cancels_answer_timer() {
    let config = GameConfig {
        vote_time: None,
        ..GameConfig::default()
    };
    let manager = manager(config);
    let handle = new_session(&manager).await;
    let ids = add_players(&handle, 4).await;
    handle.execute(Command::start_game()).await.unwrap();

    let state = answer_everything(&handle, &ids).await;
    assert_eq!(state.current_state, GamePhase::VotingOnAnswers);
    let voting = handle.fingerprint().await.unwrap();

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(handle.fingerprint().await.unwrap(), voting);
}

#[tokio::test(start_paused = true)]
async fn test_vote_timer_moves_to_next_prompt() {
    let manager = manager(GameConfig::default());
    let handle = new_session(&manager).await;
    let ids = add_players(&handle, 4).await;
    handle.execute(Command::start_game()).await.unwrap();
    answer_everything(&handle, &ids).await;

    let first = handle.fingerprint().await.unwrap();
    assert_eq!(first.phase, GamePhase::VotingOnAnswers);
    assert_eq!(first.voting_prompt, 0);

    tokio::time::sleep(Duration::from_secs(21)).await;
    let next = handle.fingerprint().await.unwrap();
    assert_eq!(next.phase, GamePhase::VotingOnAnswers);
    assert_eq!(next.voting_prompt, 1);
}
