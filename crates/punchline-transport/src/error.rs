/// Errors from the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listening socket failed.
    #[error("bind failed: {0}")]
    BindFailed(#[source] std::io::Error),

    /// Accepting a connection or its handshake failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Sending a frame failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving a frame failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
