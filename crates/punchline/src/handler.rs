//! Per-connection handler: decode requests, run them, reply.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! Requests on one connection are served in order; every request gets
//! exactly one reply echoing its `seq`, in the same frame kind it came in.

use std::sync::Arc;
use std::time::Instant;

use punchline_game::GameError;
use punchline_protocol::{
    Codec, Envelope, ErrorReply, ProtocolError, PublicState, Request, Response,
    SessionCode,
};
use punchline_session::SessionError;
use punchline_transport::{Connection, Frame, WebSocketConnection};
use serde::Deserialize;

use crate::PunchlineError;
use crate::server::ServerState;

/// Status reported for successful requests in the access log.
const STATUS_OK: u16 = 200;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), PunchlineError> {
    let conn_id = conn.id();
    let peer = conn.peer_addr();
    tracing::debug!(%conn_id, %peer, "handling new connection");

    loop {
        let frame = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(frame))) => frame,
            Ok(Ok(None)) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%conn_id, "connection idle, closing");
                let _ = conn.close().await;
                break;
            }
        };

        let started = Instant::now();
        let handled = dispatch(&state, frame.as_bytes()).await;

        let status = match &handled.response {
            Response::Ok(_) => STATUS_OK,
            Response::Error(reply) => reply.code,
        };
        let bytes = state
            .codec
            .encode(&Envelope::new(handled.seq, handled.response))?;

        tracing::info!(
            %conn_id,
            seq = handled.seq,
            op = handled.op,
            code = handled.code.as_ref().map_or("-", SessionCode::as_str),
            status,
            req_bytes = frame.as_bytes().len(),
            resp_bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request processed"
        );

        conn.send(frame.reply_with(bytes)).await?;
    }

    Ok(())
}

/// Outcome of one request, with what the access log needs.
struct Handled {
    seq: u64,
    op: &'static str,
    code: Option<SessionCode>,
    response: Response,
}

/// Just enough of an envelope to echo `seq` for a request that does not
/// otherwise decode.
#[derive(Deserialize)]
struct SeqOnly {
    #[serde(default)]
    seq: u64,
}

async fn dispatch<C: Codec>(state: &ServerState<C>, data: &[u8]) -> Handled {
    let envelope: Envelope<Request> = match state.codec.decode(data) {
        Ok(env) => env,
        Err(err) => {
            let seq = state
                .codec
                .decode::<SeqOnly>(data)
                .map(|s| s.seq)
                .unwrap_or(0);
            tracing::debug!(error = %err, "undecodable request");
            return Handled {
                seq,
                op: "Invalid",
                code: None,
                response: Response::Error(decode_error_reply(&err)),
            };
        }
    };

    let seq = envelope.seq;
    let request = envelope.payload;
    let op = request.op();
    let code = request.code().cloned();

    let result: Result<PublicState, SessionError> = match request {
        Request::CreateSession => state.sessions.create_session().await,
        Request::GetState { code, player_id } => {
            state.sessions.get_state(&code, player_id).await
        }
        Request::Execute { code, command } => {
            state.sessions.execute(&code, command).await
        }
    };

    match result {
        Ok(view) => Handled {
            seq,
            op,
            code: code.or_else(|| Some(view.code.clone())),
            response: Response::Ok(view),
        },
        Err(err) => Handled {
            seq,
            op,
            code,
            response: Response::Error(error_reply(&err)),
        },
    }
}

/// Maps a session error to its client-facing status category.
///
/// 404 for unknown sessions, players and prompts; 400 for malformed
/// commands; 409 for commands the current game state refuses; 500 for
/// server-side faults.
pub fn status_code(err: &SessionError) -> u16 {
    match err {
        SessionError::SessionNotFound(_) => 404,
        SessionError::MissingField(_) => 400,
        SessionError::Game(game) => match game {
            GameError::PlayerNotFound(_) | GameError::PromptNotFound(_) => 404,
            GameError::InvalidVoteTarget(_) => 400,
            GameError::PlayerLimitReached { .. }
            | GameError::PlayerMinimumNotMet { .. }
            | GameError::GameInProgress(_)
            | GameError::AlreadyAnswered(_) => 409,
            GameError::EmptyPromptCorpus => 500,
        },
        SessionError::CodeSpaceExhausted { .. }
        | SessionError::Entropy(_)
        | SessionError::Unavailable(_) => 500,
    }
}

/// Builds the wire reply for a session error.
pub fn error_reply(err: &SessionError) -> ErrorReply {
    ErrorReply::new(status_code(err), err.kind(), err.to_string())
}

fn decode_error_reply(err: &ProtocolError) -> ErrorReply {
    ErrorReply::new(400, "InvalidRequest", err.to_string())
}
