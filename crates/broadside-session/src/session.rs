//! Session types: the gateway's record of one connected player.

use std::time::{Duration, Instant};

use broadside_protocol::PlayerId;
use broadside_transport::ConnectionId;

/// Configuration for session tracking.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum number of simultaneously connected players. New
    /// connections beyond this are refused.
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_sessions: 1024 }
    }
}

/// A single connected player.
///
/// Lives exactly as long as the connection: there is no reconnection, so
/// a closed connection ends the session for good.
#[derive(Debug, Clone)]
pub struct Session {
    /// The identity handed to the match layer.
    pub player_id: PlayerId,

    /// The connection this player speaks through.
    pub connection_id: ConnectionId,

    /// When the session was created.
    pub connected_at: Instant,
}

impl Session {
    /// How long this player has been connected.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
