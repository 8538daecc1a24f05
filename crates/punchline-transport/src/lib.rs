//! Transport layer for Punchline.
//!
//! Provides the [`Transport`] and [`Connection`] traits the server is
//! written against, and a WebSocket implementation of both.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;

/// Opaque identifier for a connection, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One message on a connection.
///
/// Browsers send JSON as text frames; other clients may prefer binary.
/// Replies go out in the same kind of frame the request came in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    /// The frame's payload.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(data) => data,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Wraps `data` in a frame of the same kind as `self`.
    ///
    /// Falls back to a binary frame when a text reply would not be valid
    /// UTF-8.
    pub fn reply_with(&self, data: Vec<u8>) -> Frame {
        match self {
            Self::Text(_) => match String::from_utf8(data) {
                Ok(text) => Self::Text(text),
                Err(err) => Self::Binary(err.into_bytes()),
            },
            Self::Binary(_) => Self::Binary(data),
        }
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// The address the transport is listening on.
    fn local_addr(&self) -> Result<SocketAddr, Self::Error>;
}

/// A single connection that exchanges [`Frame`]s.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends a frame to the remote peer.
    async fn send(&self, frame: Frame) -> Result<(), Self::Error>;

    /// Receives the next data frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Frame>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// The remote peer's address.
    fn peer_addr(&self) -> SocketAddr;
}
