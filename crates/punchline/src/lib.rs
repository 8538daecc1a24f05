//! # Punchline
//!
//! Server for a multiplayer party game: players join a session by its
//! short code, write punchlines for prompts, vote on each other's answers
//! and collect points over a few rounds.
//!
//! Clients talk JSON over WebSocket. Each frame is one request (create a
//! session, read its state, or run a command against it) and gets exactly
//! one reply.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use punchline::prelude::*;
//!
//! # async fn start() -> Result<(), PunchlineError> {
//! let config = ServerConfig::from_env()?;
//! let prompts = load_prompts(&config.prompt_file).await?;
//! let server = PunchlineServer::builder()
//!     .bind(&config.bind_addr())
//!     .game_config(config.game.clone())
//!     .prompts(prompts)
//!     .idle_timeout(config.idle_timeout)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod prompts;
mod server;

pub use config::ServerConfig;
pub use error::PunchlineError;
pub use handler::{error_reply, status_code};
pub use prompts::load_prompts;
pub use server::{PunchlineServer, PunchlineServerBuilder};

/// Everything needed to run a server or write a client, in one import.
pub mod prelude {
    pub use crate::{
        PunchlineError, PunchlineServer, PunchlineServerBuilder, ServerConfig,
        load_prompts,
    };
    pub use punchline_game::{GameConfig, GameError, PromptCorpus};
    pub use punchline_protocol::{
        Answer, AnswerId, Codec, Command, CommandKind, Envelope, ErrorReply,
        GamePhase, JsonCodec, Player, PlayerId, Prompt, PromptId, PublicState,
        Request, Response, SessionCode,
    };
    pub use punchline_session::{SessionError, SessionManager};
}
