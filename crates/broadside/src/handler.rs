//! Per-connection handler: session setup, intent routing, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Create a session → the connection gets a `PlayerId`
//!   2. Start the writer task and send `welcome`
//!   3. Loop: receive envelopes → route intents to the match registry
//!   4. On close or idle timeout: leave the match, drop the session
//!
//! Match actors never see the socket. They push events into the player's
//! channel and the writer task drains it, so a slow client cannot stall a
//! match.

use std::sync::Arc;
use std::time::Instant;

use broadside_match::{LobbyCode, MatchError, Piece, PlayerSender};
use broadside_protocol::{ClientIntent, Codec, Coordinate, Envelope, PlayerId, ServerEvent};
use broadside_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::BroadsideError;
use crate::server::ServerState;

/// Drop guard that takes the player out of their match and ends their
/// session when the handler exits.
///
/// This runs even if the handler panics. `Drop` is synchronous, so the
/// async cleanup runs in a fire-and-forget task.
struct SessionGuard<C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for SessionGuard<C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            match depart(&state, player_id).await {
                Ok(Some(code)) => tracing::info!(%player_id, %code, "left match on disconnect"),
                Ok(None) => {}
                Err(e) => tracing::debug!(%player_id, error = %e, "leave on disconnect failed"),
            }
            let _ = state.sessions.lock().await.disconnect(player_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), BroadsideError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();

    // Create session and guard together: if creation fails there is
    // nothing to clean up.
    let player_id = state.sessions.lock().await.create(conn_id)?.player_id;
    let _guard = SessionGuard {
        player_id,
        state: Arc::clone(&state),
    };
    tracing::info!(%conn_id, %player_id, "player connected");

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_events(Arc::clone(&conn), Arc::clone(&state), rx));
    let _ = tx.send(ServerEvent::Welcome { player_id });

    loop {
        let data = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%player_id, "connection idle, closing");
                break;
            }
        };

        let envelope: Envelope<ClientIntent> = match state.codec.decode(&data) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode envelope");
                let _ = tx.send(ServerEvent::Error {
                    code: 400,
                    message: e.to_string(),
                });
                continue;
            }
        };

        handle_intent(&state, player_id, &tx, envelope.payload).await;
    }

    writer.abort();
    let _ = conn.close().await;
    // _guard drops here → match leave and session disconnect fire.
    Ok(())
}

/// Drains a player's event channel into the socket, wrapping each event
/// in an envelope with this connection's sequence number.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    let start = Instant::now();
    let mut seq: u64 = 1;

    while let Some(event) = rx.recv().await {
        let envelope = Envelope::new(next_seq(&mut seq), elapsed_ms(&start), event);
        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(conn_id = %conn.id(), error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, stopping writer");
            break;
        }
    }
}

/// Runs one intent. A rejection goes back to this player only.
async fn handle_intent<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    tx: &PlayerSender,
    intent: ClientIntent,
) {
    let name = intent.name();
    tracing::debug!(%player_id, intent = name, "intent received");

    let result = match intent {
        ClientIntent::CreateLobby => create_lobby(state, player_id, tx).await,
        ClientIntent::JoinLobby { code } => join_lobby(state, player_id, tx, &code).await,
        ClientIntent::PlaceShips { code, ships } => {
            place_ships(state, player_id, &code, ships).await
        }
        ClientIntent::Shoot { code, row, col } => {
            shoot(state, player_id, &code, Coordinate::new(row, col)).await
        }
        ClientIntent::LeaveLobby { code } => leave_lobby(state, player_id, &code).await,
    };

    if let Err(err) = result {
        tracing::debug!(%player_id, intent = name, error = %err, "intent rejected");
        let _ = tx.send(rejection(name, &err));
    }
}

async fn create_lobby<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    tx: &PlayerSender,
) -> Result<(), BroadsideError> {
    state.registry.lock().await.create(player_id, tx.clone())?;
    Ok(())
}

async fn join_lobby<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    tx: &PlayerSender,
    code: &str,
) -> Result<(), BroadsideError> {
    let handle = state.registry.lock().await.admit(code, player_id)?;
    handle.join(player_id, tx.clone()).await?;
    state.registry.lock().await.seat(player_id, &handle)?;
    Ok(())
}

async fn place_ships<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    code: &str,
    ships: Vec<Vec<Coordinate>>,
) -> Result<(), BroadsideError> {
    let handle = state.registry.lock().await.get(code)?;
    let pieces = ships.into_iter().map(Piece::new).collect();
    handle.place(player_id, pieces).await?;
    Ok(())
}

async fn shoot<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    code: &str,
    cell: Coordinate,
) -> Result<(), BroadsideError> {
    let handle = state.registry.lock().await.get(code)?;
    handle.shoot(player_id, cell).await?;
    Ok(())
}

async fn leave_lobby<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    code: &str,
) -> Result<(), BroadsideError> {
    let requested = LobbyCode::parse(code)?;
    let current = state.registry.lock().await.match_of(&player_id).cloned();
    if current != Some(requested) {
        return Err(MatchError::UnknownPlayer(player_id).into());
    }
    depart(state, player_id).await?;
    Ok(())
}

/// Takes a player out of their match, destroying it once empty. The
/// registry lock is released while the match actor works.
async fn depart<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
) -> Result<Option<LobbyCode>, BroadsideError> {
    let Some((code, handle)) = state.registry.lock().await.unseat(player_id) else {
        return Ok(None);
    };
    if let Some(handle) = handle {
        if handle.vacate(player_id).await? {
            state.registry.lock().await.retire(&handle);
        }
    }
    Ok(Some(code))
}

/// The event that reports a rejected intent.
///
/// Lobby intents answer with `lobbyError`, refused fleets with
/// `placementError`, everything else with `error` and a status code.
fn rejection(intent: &str, err: &BroadsideError) -> ServerEvent {
    let message = err.to_string();
    match (intent, err) {
        ("createLobby" | "joinLobby", BroadsideError::Match(_)) => {
            ServerEvent::LobbyError { message }
        }
        (
            "placeShips",
            BroadsideError::Match(MatchError::InvalidPlacement(_) | MatchError::AlreadyPlaced(_)),
        ) => ServerEvent::PlacementError { message },
        _ => ServerEvent::Error {
            code: err.status(),
            message,
        },
    }
}

fn elapsed_ms(start: &Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadside_match::{MatchConfig, MatchRegistry, PlacementError};
    use broadside_protocol::JsonCodec;
    use broadside_session::SessionManager;
    use futures_util::FutureExt;
    use std::time::Duration;
    use tokio::sync::Mutex;

    fn state_with_channel(channel_size: usize) -> ServerState<JsonCodec> {
        ServerState {
            sessions: Mutex::new(SessionManager::default()),
            registry: Mutex::new(MatchRegistry::new(MatchConfig {
                channel_size,
                ..MatchConfig::default()
            })),
            codec: JsonCodec,
            idle_timeout: Duration::from_secs(60),
        }
    }

    #[tokio::test]
    async fn test_join_lobby_releases_registry_while_match_is_busy() {
        let state = state_with_channel(1);
        let (host_tx, _host_rx) = mpsc::unbounded_channel();
        let code = state.registry.lock().await.create(PlayerId(1), host_tx).unwrap();
        let handle = state.registry.lock().await.get(code.as_str()).unwrap();

        // Fill the one-slot command queue before the actor gets to run.
        assert!(handle.info().now_or_never().is_none());

        let (guest_tx, _guest_rx) = mpsc::unbounded_channel();
        let mut join = std::pin::pin!(join_lobby(&state, PlayerId(2), &guest_tx, code.as_str()));
        assert!(futures_util::poll!(join.as_mut()).is_pending());

        // The join is parked on the actor, not on the registry.
        assert!(state.registry.try_lock().is_ok());
        let (other_tx, _other_rx) = mpsc::unbounded_channel();
        create_lobby(&state, PlayerId(3), &other_tx).await.unwrap();

        join.await.unwrap();
        let registry = state.registry.lock().await;
        assert_eq!(registry.match_of(&PlayerId(2)), Some(&code));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_depart_last_player_destroys_match() {
        let state = state_with_channel(4);
        let (tx, _rx) = mpsc::unbounded_channel();
        let code = state.registry.lock().await.create(PlayerId(1), tx).unwrap();

        assert_eq!(depart(&state, PlayerId(1)).await.unwrap(), Some(code));
        assert!(state.registry.lock().await.is_empty());
        assert_eq!(depart(&state, PlayerId(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_leave_lobby_wrong_code_keeps_seat() {
        let state = state_with_channel(4);
        let (tx, _rx) = mpsc::unbounded_channel();
        let code = state.registry.lock().await.create(PlayerId(1), tx).unwrap();
        let other = if code.as_str() == "ZZZZZ9" { "ZZZZZ8" } else { "ZZZZZ9" };

        let err = leave_lobby(&state, PlayerId(1), other).await.unwrap_err();
        assert!(matches!(err, BroadsideError::Match(MatchError::UnknownPlayer(_))));
        assert_eq!(state.registry.lock().await.match_of(&PlayerId(1)), Some(&code));
    }

    #[test]
    fn test_rejection_lobby_intents_use_lobby_error() {
        let err = BroadsideError::Match(MatchError::LobbyNotFound("NOPE00".into()));
        assert_eq!(
            rejection("joinLobby", &err),
            ServerEvent::LobbyError {
                message: "lobby NOPE00 not found".into()
            }
        );
    }

    #[test]
    fn test_rejection_invalid_fleet_uses_placement_error() {
        let err = BroadsideError::Match(PlacementError::NotALine { index: 2 }.into());
        assert!(matches!(
            rejection("placeShips", &err),
            ServerEvent::PlacementError { .. }
        ));
    }

    #[test]
    fn test_rejection_place_in_unknown_lobby_is_plain_error() {
        let err = BroadsideError::Match(MatchError::LobbyNotFound("NOPE00".into()));
        assert!(matches!(
            rejection("placeShips", &err),
            ServerEvent::Error { code: 404, .. }
        ));
    }

    #[test]
    fn test_rejection_shot_carries_status() {
        let err = BroadsideError::Match(MatchError::NotYourTurn(PlayerId(3)));
        assert!(matches!(
            rejection("shoot", &err),
            ServerEvent::Error { code: 403, .. }
        ));
    }

    #[test]
    fn test_next_seq_increments() {
        let mut seq = 1;
        assert_eq!(next_seq(&mut seq), 1);
        assert_eq!(next_seq(&mut seq), 2);
        assert_eq!(seq, 3);
    }
}
