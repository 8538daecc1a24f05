//! Wire protocol for Punchline.
//!
//! This crate is the vocabulary every other layer shares:
//!
//! - **Types** ([`PlayerId`], [`Player`], [`Prompt`], [`Answer`],
//!   [`GamePhase`], [`SessionCode`]): the public pieces of a session.
//! - **Commands** ([`Command`], [`CommandKind`]): what clients ask a
//!   session to do.
//! - **State** ([`PublicState`]): what a session shows back.
//! - **Messages** ([`Envelope`], [`Request`], [`Response`]): how those
//!   travel over a connection.
//! - **Codec** ([`Codec`], [`JsonCodec`]): how messages become bytes.
//!
//! ```text
//! Transport (frames) → Protocol (Envelope<Request>) → Session (Command)
//! ```

mod codec;
mod command;
mod error;
mod message;
mod state;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use command::{Command, CommandKind};
pub use error::ProtocolError;
pub use message::{Envelope, ErrorReply, Request, Response};
pub use state::PublicState;
pub use types::{
    Answer, AnswerId, GamePhase, Player, PlayerId, Prompt, PromptId,
    SessionCode,
};
