//! Socket plumbing for the Broadside server.
//!
//! The game server never touches a WebSocket directly. It accepts through
//! a [`Transport`], talks to each client through a [`Connection`] that
//! moves whole frames as bytes, and keys everything it remembers about a
//! client by that connection's [`ConnectionId`].
//!
//! # Feature Flags
//!
//! - `websocket` (default): [`WebSocketTransport`] over `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Process-unique number the transport stamps on each accepted socket.
///
/// Sessions are keyed by it. Ids are never reused while the process runs,
/// so a stale id cannot reach a newer client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
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

/// Listening side: yields one [`Connection`] per client that completes
/// the opening handshake.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for a client and finishes its handshake (for WebSockets, the
    /// HTTP upgrade) before returning it.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Refuses further clients. Clients already handed out keep their
    /// sockets until the server closes them.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// One client socket, shared between the handler that reads intents and
/// the task that writes match events.
///
/// Reading and writing lock separate halves, so an outbound event never
/// waits on a `recv` that is parked until the client speaks.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Writes one frame. Payloads that are valid UTF-8 travel as text
    /// frames, which browsers hand to scripts as strings.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Next data frame from the client. Control frames (ping, pong) are
    /// answered or skipped below this call.
    ///
    /// `Ok(None)` means the client closed the socket.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Sends a close frame.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
