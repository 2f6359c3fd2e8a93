/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Wrote to a socket after either side started closing it.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing a frame failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding the listener or completing the WebSocket upgrade failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The transport was shut down.
    #[error("transport shut down")]
    Shutdown,
}

impl TransportError {
    /// Classifies a failed write. Writes after a close handshake began
    /// are [`ConnectionClosed`](Self::ConnectionClosed).
    #[cfg(feature = "websocket")]
    pub(crate) fn on_send(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error;
        use tokio_tungstenite::tungstenite::error::ProtocolError;

        match err {
            Error::ConnectionClosed
            | Error::AlreadyClosed
            | Error::Protocol(ProtocolError::SendAfterClosing) => {
                Self::ConnectionClosed(err.to_string())
            }
            other => Self::SendFailed(Self::io(std::io::ErrorKind::BrokenPipe, other)),
        }
    }

    /// Wraps a WebSocket protocol error as an I/O error of the given kind.
    #[cfg(feature = "websocket")]
    pub(crate) fn io(
        kind: std::io::ErrorKind,
        err: tokio_tungstenite::tungstenite::Error,
    ) -> std::io::Error {
        std::io::Error::new(kind, err)
    }
}
