//! WebSocket transport implementation using `tokio-tungstenite`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Frame, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = WebSocketStream<TcpStream>;

fn io_error(
    kind: std::io::ErrorKind,
    err: tokio_tungstenite::tungstenite::Error,
) -> std::io::Error {
    std::io::Error::new(kind, err)
}

/// A WebSocket [`Transport`] listening on a TCP socket.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds to `addr` (use port 0 to let the OS pick one).
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| {
                TransportError::AcceptFailed(io_error(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %peer, "accepted WebSocket connection");

        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            peer,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }

    fn local_addr(&self) -> Result<SocketAddr, Self::Error> {
        self.listener.local_addr().map_err(TransportError::BindFailed)
    }
}

/// A single WebSocket connection.
///
/// Reading and writing use separate halves, so a pending `recv` never
/// blocks a `send`.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, frame: Frame) -> Result<(), Self::Error> {
        let msg = match frame {
            Frame::Text(text) => Message::Text(text.into()),
            Frame::Binary(data) => Message::Binary(data.into()),
        };
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(io_error(std::io::ErrorKind::BrokenPipe, e))
        })
    }

    async fn recv(&self) -> Result<Option<Frame>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Frame::Text(text.as_str().to_owned())));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(Frame::Binary(data.into())));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // tungstenite answers pings itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(io_error(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(io_error(std::io::ErrorKind::BrokenPipe, e))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}
