//! Session actor: a Tokio task that owns one game instance.
//!
//! Every command for a session goes through the actor's mailbox and is
//! applied to completion before the next one is read, so commands on a
//! session never interleave. Phase timers are small side tasks that post
//! a guarded "advance" back into the same mailbox.

use std::time::Duration;

use punchline_game::{Fingerprint, Instance};
use punchline_protocol::{Command, CommandKind, PlayerId, PublicState, SessionCode};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::SessionError;

/// Messages a session actor accepts.
pub(crate) enum SessionCommand {
    /// Apply a client command and reply with the resulting view.
    Execute {
        command: Command,
        reply: oneshot::Sender<Result<PublicState, SessionError>>,
    },

    /// Project the state for a player without changing anything.
    Query {
        player_id: PlayerId,
        reply: oneshot::Sender<PublicState>,
    },

    /// Advance only if the instance is still exactly at `expected`.
    /// Timers send this without a reply channel.
    AdvanceIf {
        expected: Fingerprint,
        reply: Option<oneshot::Sender<bool>>,
    },

    /// Report where the session currently is.
    Fingerprint {
        reply: oneshot::Sender<Fingerprint>,
    },
}

/// Handle to a running session actor.
///
/// Cheap to clone. The actor stops once every handle is dropped; pending
/// timers do not keep it alive.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    code: SessionCode,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// The session's code.
    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    /// Applies one command and returns the view of its acting player
    /// (the new player's view for `AddPlayer`).
    ///
    /// # Errors
    /// - [`SessionError::MissingField`] before the game is touched, when a
    ///   field the command type needs is absent.
    /// - [`SessionError::Game`] when the rules refuse the command.
    /// - [`SessionError::Unavailable`] when the actor has stopped.
    pub async fn execute(&self, command: Command) -> Result<PublicState, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionCommand::Execute {
            command,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Returns the view of `player_id` (`PlayerId::ANONYMOUS` for the
    /// shared view).
    pub async fn query(&self, player_id: PlayerId) -> Result<PublicState, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionCommand::Query {
            player_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Advances the game if it is still at `expected`. Returns whether it
    /// advanced.
    ///
    /// This is what phase timers do; it is public so callers can force a
    /// timeout without waiting for it.
    pub async fn advance_if(&self, expected: Fingerprint) -> Result<bool, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionCommand::AdvanceIf {
            expected,
            reply: Some(reply_tx),
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Returns the fingerprint the session is currently at.
    pub async fn fingerprint(&self) -> Result<Fingerprint, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionCommand::Fingerprint { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> SessionError {
        SessionError::Unavailable(self.code.clone())
    }
}

/// The actor state. Runs inside its own Tokio task.
struct SessionActor {
    instance: Instance,
    receiver: mpsc::Receiver<SessionCommand>,
    /// Given to timers so they never keep the session alive.
    timer_sender: mpsc::WeakSender<SessionCommand>,
    timer: Option<JoinHandle<()>>,
}

impl SessionActor {
    async fn run(mut self) {
        info!(code = %self.instance.code(), "session actor started");

        while let Some(cmd) = self.receiver.recv().await {
            let before = self.instance.fingerprint();

            match cmd {
                SessionCommand::Execute { command, reply } => {
                    let kind = command.kind;
                    let result = self.apply(command);
                    if let Err(err) = &result {
                        debug!(
                            code = %self.instance.code(),
                            %kind,
                            error = %err,
                            "command rejected"
                        );
                    }
                    let _ = reply.send(result);
                }
                SessionCommand::Query { player_id, reply } => {
                    let _ = reply.send(self.instance.state(player_id));
                }
                SessionCommand::AdvanceIf { expected, reply } => {
                    let fired = self.advance_if(expected);
                    if let Some(reply) = reply {
                        let _ = reply.send(fired);
                    }
                }
                SessionCommand::Fingerprint { reply } => {
                    let _ = reply.send(self.instance.fingerprint());
                }
            }

            if self.instance.fingerprint() != before {
                self.schedule_timer();
            }
        }

        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        info!(code = %self.instance.code(), "session actor stopped");
    }

    /// Validates required fields, then runs the command on the instance.
    fn apply(&mut self, command: Command) -> Result<PublicState, SessionError> {
        let viewer = command.viewer();

        match command.kind {
            CommandKind::GetState => {}
            CommandKind::AddPlayer => {
                let player = command.player.ok_or(SessionError::MissingField("player"))?;
                let id = self.instance.add_player(player)?;
                return Ok(self.instance.state(id));
            }
            CommandKind::UpdatePlayer => {
                let player = command.player.ok_or(SessionError::MissingField("player"))?;
                self.instance.update_player(player)?;
            }
            CommandKind::RemovePlayer => {
                let id = command
                    .player
                    .map(|p| p.id)
                    .filter(|id| !id.is_anonymous())
                    .or(command.player_id)
                    .ok_or(SessionError::MissingField("playerId"))?;
                self.instance.remove_player(id)?;
            }
            CommandKind::StartGame => self.instance.advance_state()?,
            CommandKind::AnswerPrompt => {
                let player_id = command
                    .player_id
                    .ok_or(SessionError::MissingField("playerId"))?;
                let prompt_id = command
                    .prompt_id
                    .ok_or(SessionError::MissingField("promptId"))?;
                let answer = command.answer.ok_or(SessionError::MissingField("answer"))?;
                self.instance.add_answer(player_id, prompt_id, answer.text)?;
            }
            CommandKind::Vote => {
                let player_id = command
                    .player_id
                    .ok_or(SessionError::MissingField("playerId"))?;
                let answer_id = command
                    .answer
                    .map(|a| a.id)
                    .filter(|id| id.0 != 0)
                    .ok_or(SessionError::MissingField("answer.id"))?;
                self.instance.vote(player_id, answer_id)?;
            }
        }

        Ok(self.instance.state(viewer))
    }

    fn advance_if(&mut self, expected: Fingerprint) -> bool {
        let current = self.instance.fingerprint();
        if current != expected {
            trace!(
                code = %self.instance.code(),
                ?expected,
                ?current,
                "stale advance ignored"
            );
            return false;
        }
        // Advancing only fails out of the lobby, which is never timed.
        match self.instance.advance_state() {
            Ok(()) => true,
            Err(err) => {
                debug!(code = %self.instance.code(), error = %err, "timed advance refused");
                false
            }
        }
    }

    /// Replaces the pending timer with one for the current phase, if the
    /// phase is timed.
    fn schedule_timer(&mut self) {
        if let Some(previous) = self.timer.take() {
            previous.abort();
        }

        let expected = self.instance.fingerprint();
        let Some(delay) = self.instance.config().phase_time(expected.phase) else {
            return;
        };

        debug!(
            code = %self.instance.code(),
            phase = %expected.phase,
            delay_ms = delay.as_millis() as u64,
            "phase timer scheduled"
        );
        self.timer = Some(tokio::spawn(run_timer(
            self.timer_sender.clone(),
            expected,
            delay,
        )));
    }
}

/// Sleeps, then asks the session to advance if it has not moved on.
async fn run_timer(
    sender: mpsc::WeakSender<SessionCommand>,
    expected: Fingerprint,
    delay: Duration,
) {
    tokio::time::sleep(delay).await;

    let Some(sender) = sender.upgrade() else {
        trace!("session gone before timer fired");
        return;
    };
    let _ = sender
        .send(SessionCommand::AdvanceIf {
            expected,
            reply: None,
        })
        .await;
}

/// Spawns a session actor for `instance` and returns its handle.
///
/// `mailbox_size` bounds the command queue; senders wait when it is full.
pub(crate) fn spawn_session(instance: Instance, mailbox_size: usize) -> SessionHandle {
    let (tx, rx) = mpsc::channel(mailbox_size);
    let code = instance.code().clone();

    let actor = SessionActor {
        instance,
        receiver: rx,
        timer_sender: tx.downgrade(),
        timer: None,
    };

    tokio::spawn(actor.run());

    SessionHandle { code, sender: tx }
}
