//! The session manager: tracks every connected player.
//!
//! # Concurrency note
//!
//! `SessionManager` is a plain `HashMap` wrapper and is not thread-safe
//! on its own. The server keeps it behind a mutex and holds that lock
//! only for the duration of a single call, never across I/O.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use broadside_protocol::PlayerId;
use broadside_transport::ConnectionId;

use crate::{Session, SessionConfig, SessionError};

/// Maps connections to player identities.
///
/// Match membership is not tracked here; the match registry owns it.
pub struct SessionManager {
    /// Live sessions, keyed by the identity the match layer sees.
    sessions: HashMap<PlayerId, Session>,

    /// Connections that already carry a session. Kept in sync with
    /// `sessions`.
    connections: HashSet<ConnectionId>,

    /// Next identity to hand out. Identities are never reused within a
    /// process, so a stale `PlayerId` can never alias a new player.
    next_player: u64,

    config: SessionConfig,
}

impl SessionManager {
    /// Creates a new, empty session manager with the given config.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            connections: HashSet::new(),
            next_player: 1,
            config,
        }
    }

    /// Creates a session for a freshly accepted connection and assigns
    /// it a new `PlayerId`.
    ///
    /// # Errors
    /// - [`SessionError::AlreadyConnected`] if the connection already
    ///   has a session.
    /// - [`SessionError::CapacityExceeded`] at the configured limit.
    pub fn create(
        &mut self,
        connection_id: ConnectionId,
    ) -> Result<&Session, SessionError> {
        if self.connections.contains(&connection_id) {
            return Err(SessionError::AlreadyConnected(connection_id));
        }
        if self.sessions.len() >= self.config.max_sessions {
            return Err(SessionError::CapacityExceeded(self.config.max_sessions));
        }

        let player_id = PlayerId(self.next_player);
        self.next_player += 1;

        self.connections.insert(connection_id);
        let session = self.sessions.entry(player_id).or_insert(Session {
            player_id,
            connection_id,
            connected_at: Instant::now(),
        });

        tracing::info!(%player_id, %connection_id, "session created");
        Ok(session)
    }

    /// Ends a player's session and returns it.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the session is already gone.
    pub fn disconnect(&mut self, player_id: PlayerId) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;
        self.connections.remove(&session.connection_id);

        tracing::info!(
            %player_id,
            connection_id = %session.connection_id,
            connected_secs = session.age().as_secs(),
            "session closed"
        );
        Ok(session)
    }

    /// Looks up a session by player ID.
    pub fn get(&self, player_id: &PlayerId) -> Option<&Session> {
        self.sessions.get(player_id)
    }

    /// Returns the number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

// =========================================================================
// Tests
// =========================================================================
