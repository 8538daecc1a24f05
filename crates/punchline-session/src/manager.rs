//! Session manager: creates sessions and finds them by code.

use std::collections::HashMap;
use std::sync::Mutex;

use punchline_game::{GameConfig, Instance, PromptCorpus};
use punchline_protocol::{Command, PlayerId, PublicState, SessionCode};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::actor::spawn_session;
use crate::{CodeGenerator, CodeSource, SessionError, SessionHandle};

/// How many codes to draw before giving up on finding a free one.
pub const MAX_CODE_ATTEMPTS: usize = 128;

/// Code → session map plus the code source, guarded together so that
/// checking a code and claiming it happen under one lock.
struct Directory {
    sessions: HashMap<SessionCode, SessionHandle>,
    codes: Box<dyn CodeSource>,
}

/// Owns every live session.
///
/// Share it with `Arc`. The directory lock is held only to look up or
/// insert a handle, never while a session runs a command, so a slow
/// session does not hold up the others.
pub struct SessionManager {
    directory: Mutex<Directory>,
    config: GameConfig,
    corpus: PromptCorpus,
}

impl SessionManager {
    /// Creates a manager with an OS-seeded [`CodeGenerator`].
    ///
    /// # Errors
    /// [`SessionError::Entropy`] if the generator cannot be seeded.
    pub fn new(config: GameConfig, corpus: PromptCorpus) -> Result<Self, SessionError> {
        Ok(Self::with_code_source(
            config,
            corpus,
            CodeGenerator::from_entropy()?,
        ))
    }

    /// Creates a manager drawing codes from `codes`.
    pub fn with_code_source(
        config: GameConfig,
        corpus: PromptCorpus,
        codes: impl CodeSource,
    ) -> Self {
        Self {
            directory: Mutex::new(Directory {
                sessions: HashMap::new(),
                codes: Box::new(codes),
            }),
            config: config.validated(),
            corpus,
        }
    }

    /// The (validated) configuration every new session gets.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Starts a new session under an unused code and returns its initial
    /// state.
    ///
    /// Must be called within a Tokio runtime.
    ///
    /// # Errors
    /// - [`SessionError::CodeSpaceExhausted`] if [`MAX_CODE_ATTEMPTS`]
    ///   candidates were all taken.
    /// - Any error of the code source.
    pub async fn create_session(&self) -> Result<PublicState, SessionError> {
        let mut dir = self.lock();
        let code = Self::claim_code(&mut dir, self.config.code_length)?;

        let instance = Instance::new(
            code.clone(),
            self.corpus.clone(),
            self.config.clone(),
            StdRng::from_rng(&mut rand::rng()),
        );
        // Projected before the actor exists, so no command can land first.
        let initial = instance.state(PlayerId::ANONYMOUS);
        let handle = spawn_session(instance, self.config.mailbox_size);
        dir.sessions.insert(code.clone(), handle);

        info!(%code, sessions = dir.sessions.len(), "session created");
        Ok(initial)
    }

    /// Draws codes until one is free.
    fn claim_code(dir: &mut Directory, length: usize) -> Result<SessionCode, SessionError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = dir.codes.next_code(length)?;
            if !dir.sessions.contains_key(&code) {
                return Ok(code);
            }
            if attempt % 16 == 0 {
                warn!(attempt, length, "session code collisions piling up");
            }
        }
        Err(SessionError::CodeSpaceExhausted {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    /// Finds a session by code.
    pub fn lookup(&self, code: &SessionCode) -> Result<SessionHandle, SessionError> {
        self.lock()
            .sessions
            .get(code)
            .cloned()
            .ok_or_else(|| SessionError::SessionNotFound(code.clone()))
    }

    /// Returns a player's view of a session.
    pub async fn get_state(
        &self,
        code: &SessionCode,
        player_id: PlayerId,
    ) -> Result<PublicState, SessionError> {
        self.lookup(code)?.query(player_id).await
    }

    /// Runs a command on a session.
    pub async fn execute(
        &self,
        code: &SessionCode,
        command: Command,
    ) -> Result<PublicState, SessionError> {
        self.lookup(code)?.execute(command).await
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Codes of all live sessions.
    pub fn codes(&self) -> Vec<SessionCode> {
        self.lock().sessions.keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Directory> {
        // The map is never left half-updated, so poisoning is harmless.
        self.directory
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
