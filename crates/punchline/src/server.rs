//! `PunchlineServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session manager →
//! game instance.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use punchline_game::{GameConfig, GameError, PromptCorpus};
use punchline_protocol::{Codec, JsonCodec};
use punchline_session::SessionManager;
use punchline_transport::{Transport, WebSocketTransport};

use crate::PunchlineError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) sessions: SessionManager,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Punchline server.
///
/// # Example
///
/// ```rust,no_run
/// use punchline::prelude::*;
///
/// # async fn start() -> Result<(), PunchlineError> {
/// let prompts = load_prompts("prompts.txt").await?;
/// let server = PunchlineServer::builder()
///     .bind("0.0.0.0:3001")
///     .prompts(prompts)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct PunchlineServerBuilder {
    bind_addr: String,
    game_config: GameConfig,
    prompts: Option<PromptCorpus>,
    idle_timeout: Duration,
}

impl PunchlineServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            game_config: GameConfig::default(),
            prompts: None,
            idle_timeout: Duration::from_secs(120),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the rules every new session gets.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Sets the prompt corpus. Required.
    pub fn prompts(mut self, prompts: PromptCorpus) -> Self {
        self.prompts = Some(prompts);
        self
    }

    /// Closes connections that send nothing for this long.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Binds the listener and prepares the session manager.
    ///
    /// Uses `JsonCodec` over `WebSocketTransport`.
    ///
    /// # Errors
    /// - [`PunchlineError::Game`] if no prompts were given.
    /// - [`PunchlineError::Session`] if session codes cannot be seeded.
    /// - [`PunchlineError::Transport`] if binding fails.
    pub async fn build(self) -> Result<PunchlineServer<JsonCodec>, PunchlineError> {
        let prompts = self.prompts.ok_or(GameError::EmptyPromptCorpus)?;
        let sessions = SessionManager::new(self.game_config, prompts)?;
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            sessions,
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
        });

        Ok(PunchlineServer { transport, state })
    }
}

impl Default for PunchlineServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Punchline server.
///
/// Call [`run`](Self::run) or [`run_until`](Self::run_until) to start
/// accepting connections.
pub struct PunchlineServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl PunchlineServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> PunchlineServerBuilder {
        PunchlineServerBuilder::new()
    }
}

impl<C: Codec> PunchlineServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, PunchlineError> {
        Ok(self.transport.local_addr()?)
    }

    /// The server's session directory.
    pub fn sessions(&self) -> &SessionManager {
        &self.state.sessions
    }

    /// Accepts connections until the process is terminated.
    pub async fn run(self) -> Result<(), PunchlineError> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` completes.
    ///
    /// Connections already being served keep running on their own tasks;
    /// only the listener stops.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), PunchlineError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Punchline server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!(
                        sessions = self.state.sessions.session_count(),
                        "shutdown requested, no longer accepting connections"
                    );
                    return Ok(());
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }
    }
}
