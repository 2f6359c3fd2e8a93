//! Error types for the session layer.

use broadside_protocol::PlayerId;
use broadside_transport::ConnectionId;

/// Errors that can occur while tracking sessions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session exists for the given player. Disconnect paths treat
    /// this as "already gone".
    #[error("session not found for player {0}")]
    NotFound(PlayerId),

    /// The connection already has a session. One connection carries
    /// exactly one player identity.
    #[error("connection {0} already has a session")]
    AlreadyConnected(ConnectionId),

    /// The server is at its configured session limit.
    #[error("session limit of {0} reached")]
    CapacityExceeded(usize),
}
