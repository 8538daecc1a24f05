//! Request/response envelopes exchanged over a connection.
//!
//! Every frame a client sends is an [`Envelope<Request>`]; the server
//! answers each one with exactly one [`Envelope<Response>`] carrying the
//! same `seq`, so clients can match replies to requests.
//!
//! ```text
//! → {"seq":1,"payload":{"op":"Execute","code":"QXZT","command":{"type":"StartGame"}}}
//! ← {"seq":1,"payload":{"ok":{"code":"QXZT","players":[...],"currentState":"AnsweringPrompts",...}}}
//! ← {"seq":2,"payload":{"error":{"code":404,"kind":"SessionNotFound","message":"..."}}}
//! ```

use serde::{Deserialize, Serialize};

use crate::{Command, PlayerId, PublicState, SessionCode};

/// Sequence-numbered wrapper around a request or response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Chosen by the client, echoed by the server.
    #[serde(default)]
    pub seq: u64,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(seq: u64, payload: T) -> Self {
        Self { seq, payload }
    }
}

/// What a client can ask of the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "PascalCase")]
pub enum Request {
    /// Create a new session and return its initial state.
    CreateSession,

    /// Read a session's state as seen by `player_id` (0 = anonymous).
    #[serde(rename_all = "camelCase")]
    GetState {
        code: SessionCode,
        #[serde(default)]
        player_id: PlayerId,
    },

    /// Run a command against a session.
    Execute {
        code: SessionCode,
        command: Command,
    },
}

impl Request {
    /// Short name for logs.
    pub fn op(&self) -> &'static str {
        match self {
            Self::CreateSession => "CreateSession",
            Self::GetState { .. } => "GetState",
            Self::Execute { .. } => "Execute",
        }
    }

    /// The session the request targets, if any.
    pub fn code(&self) -> Option<&SessionCode> {
        match self {
            Self::CreateSession => None,
            Self::GetState { code, .. } | Self::Execute { code, .. } => {
                Some(code)
            }
        }
    }
}

/// The server's reply to one request.
///
/// Externally tagged (`{"ok": ...}` / `{"error": ...}`) so the state's
/// numeric vote keys survive decoding without buffering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Response {
    /// The request succeeded; here is the resulting state.
    Ok(PublicState),

    /// The request failed.
    Error(ErrorReply),
}

impl Response {
    /// Returns the state of a successful reply.
    pub fn into_state(self) -> Result<PublicState, ErrorReply> {
        match self {
            Self::Ok(state) => Ok(state),
            Self::Error(err) => Err(err),
        }
    }
}

/// Client-facing description of a failure.
///
/// `code` borrows HTTP status numbers for its categories: 400 bad request,
/// 404 not found, 409 conflict, 500 server fault. `kind` names the
/// specific error (e.g. `"PlayerLimitReached"`) for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub code: u16,
    pub kind: String,
    pub message: String,
}

impl ErrorReply {
    pub fn new(
        code: u16,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            kind: kind.into(),
            message: message.into(),
        }
    }
}
