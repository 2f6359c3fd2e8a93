//! Unified error type for the Broadside server.

use broadside_match::MatchError;
use broadside_protocol::ProtocolError;
use broadside_session::SessionError;
use broadside_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BroadsideError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (capacity, unknown player).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A rejected game intent.
    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BroadsideError {
    /// HTTP-style status for the client-facing `error` event.
    pub fn status(&self) -> u16 {
        match self {
            Self::Match(err) => err.status(),
            Self::Protocol(_) => 400,
            Self::Session(SessionError::CapacityExceeded(_)) => 503,
            Self::Transport(_) | Self::Session(_) | Self::Config(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let broadside_err: BroadsideError = err.into();
        assert!(matches!(broadside_err, BroadsideError::Transport(_)));
        assert!(broadside_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let broadside_err: BroadsideError = err.into();
        assert!(matches!(broadside_err, BroadsideError::Protocol(_)));
        assert_eq!(broadside_err.status(), 400);
    }

    #[test]
    fn test_from_match_error_keeps_status() {
        let err = MatchError::LobbyNotFound("QQQQQQ".into());
        let broadside_err: BroadsideError = err.into();
        assert!(matches!(broadside_err, BroadsideError::Match(_)));
        assert_eq!(broadside_err.status(), 404);
        assert_eq!(broadside_err.to_string(), "lobby QQQQQQ not found");
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::CapacityExceeded(8);
        let broadside_err: BroadsideError = err.into();
        assert_eq!(broadside_err.status(), 503);
    }
}
