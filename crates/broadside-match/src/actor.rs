//! Match actor: a Tokio task that owns one [`Match`].
//!
//! All commands for a match go through its bounded channel and are
//! handled one at a time, so two intents never touch the same match
//! concurrently. Events go out through each player's unbounded sender
//! and are never awaited.

use std::collections::HashMap;

use broadside_protocol::{Coordinate, PlayerId, Recipient, ServerEvent};
use tokio::sync::{mpsc, oneshot};

use crate::game::{AttackOutcome, JoinOutcome, Match, PlacementOutcome};
use crate::{LobbyCode, MatchConfig, MatchError, MatchPhase, Piece};

/// Channel sender for delivering events to one player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands a [`MatchHandle`] sends to its actor.
pub(crate) enum MatchCommand {
    Join {
        player_id: PlayerId,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<JoinOutcome, MatchError>>,
    },

    Place {
        player_id: PlayerId,
        pieces: Vec<Piece>,
        reply: oneshot::Sender<Result<PlacementOutcome, MatchError>>,
    },

    Shoot {
        player_id: PlayerId,
        cell: Coordinate,
        reply: oneshot::Sender<Result<AttackOutcome, MatchError>>,
    },

    /// Replies with the number of players left, or `None` if the player
    /// was not seated.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Option<usize>>,
    },

    GetInfo {
        reply: oneshot::Sender<MatchInfo>,
    },

    Shutdown,
}

/// A snapshot of match metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInfo {
    pub code: LobbyCode,
    pub phase: MatchPhase,
    pub player_count: usize,
    pub turn: Option<PlayerId>,
    pub winner: Option<PlayerId>,
}

/// Handle to a running match actor.
///
/// Cheap to clone. The registry keeps one per match; callers clone it
/// out so they can await the actor without holding the registry lock.
#[derive(Debug, Clone)]
pub struct MatchHandle {
    code: LobbyCode,
    sender: mpsc::Sender<MatchCommand>,
}

impl MatchHandle {
    pub fn code(&self) -> &LobbyCode {
        &self.code
    }

    /// Seats `player_id` and registers their event channel.
    pub async fn join(
        &self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<JoinOutcome, MatchError> {
        self.request(|reply| MatchCommand::Join {
            player_id,
            sender,
            reply,
        })
        .await?
    }

    /// Submits a fleet for `player_id`.
    pub async fn place(
        &self,
        player_id: PlayerId,
        pieces: Vec<Piece>,
    ) -> Result<PlacementOutcome, MatchError> {
        self.request(|reply| MatchCommand::Place {
            player_id,
            pieces,
            reply,
        })
        .await?
    }

    /// Fires at `cell` on behalf of `player_id`.
    pub async fn shoot(
        &self,
        player_id: PlayerId,
        cell: Coordinate,
    ) -> Result<AttackOutcome, MatchError> {
        self.request(|reply| MatchCommand::Shoot {
            player_id,
            cell,
            reply,
        })
        .await?
    }

    /// Removes `player_id`. Returns how many players remain, or `None` if
    /// the player was not seated.
    pub async fn leave(&self, player_id: PlayerId) -> Result<Option<usize>, MatchError> {
        self.request(|reply| MatchCommand::Leave { player_id, reply })
            .await
    }

    /// Removes `player_id` and reports whether the match is now empty.
    ///
    /// A match whose actor already stopped counts as empty.
    pub async fn vacate(&self, player_id: PlayerId) -> Result<bool, MatchError> {
        match self.leave(player_id).await {
            Ok(remaining) => Ok(remaining == Some(0)),
            Err(MatchError::Unavailable(_)) => Ok(true),
            Err(err) => Err(err),
        }
    }

    pub async fn info(&self) -> Result<MatchInfo, MatchError> {
        self.request(|reply| MatchCommand::GetInfo { reply }).await
    }

    /// Asks the actor to stop without waiting for queue space. If the
    /// queue is full the actor still stops once every handle is dropped.
    pub fn close(&self) {
        let _ = self.sender.try_send(MatchCommand::Shutdown);
    }

    /// Both handles drive the same actor. Codes are reused after a match
    /// is destroyed, so equal codes alone do not prove this.
    pub fn same_match(&self, other: &MatchHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> MatchCommand,
    ) -> Result<T, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| MatchError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.code.clone()))
    }
}

struct MatchActor {
    game: Match,
    senders: HashMap<PlayerId, PlayerSender>,
    receiver: mpsc::Receiver<MatchCommand>,
}

impl MatchActor {
    async fn run(mut self) {
        let code = self.game.code().clone();
        tracing::info!(%code, "match actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                MatchCommand::Join {
                    player_id,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(player_id, sender);
                    let _ = reply.send(result);
                }
                MatchCommand::Place {
                    player_id,
                    pieces,
                    reply,
                } => {
                    let result = self.handle_place(player_id, pieces);
                    let _ = reply.send(result);
                }
                MatchCommand::Shoot {
                    player_id,
                    cell,
                    reply,
                } => {
                    let result = self.handle_shoot(player_id, cell);
                    let _ = reply.send(result);
                }
                MatchCommand::Leave { player_id, reply } => {
                    let remaining = self.handle_leave(player_id);
                    let _ = reply.send(remaining);
                    if remaining == Some(0) {
                        tracing::info!(%code, "match empty");
                        break;
                    }
                }
                MatchCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                MatchCommand::Shutdown => {
                    tracing::info!(%code, "match shutting down");
                    break;
                }
            }
        }

        tracing::info!(%code, "match actor stopped");
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<JoinOutcome, MatchError> {
        let outcome = self
            .game
            .join(player_id)
            .inspect_err(|err| self.rejected(player_id, "join", err))?;
        self.senders.insert(player_id, sender);

        let code = self.game.code().to_string();
        let mut events = vec![
            (Recipient::Player(player_id), ServerEvent::LobbyJoined { code }),
            (
                Recipient::All,
                ServerEvent::PlayerJoined {
                    player_count: outcome.player_count,
                },
            ),
        ];
        if outcome.phase == MatchPhase::Placing {
            let first = self.game.players()[0];
            for &pid in self.game.players() {
                events.push((
                    Recipient::Player(pid),
                    ServerEvent::GameStart {
                        your_turn: pid == first,
                        message: "Place your ships".into(),
                    },
                ));
            }
        }
        self.dispatch(events);
        Ok(outcome)
    }

    fn handle_place(
        &mut self,
        player_id: PlayerId,
        pieces: Vec<Piece>,
    ) -> Result<PlacementOutcome, MatchError> {
        let outcome = self
            .game
            .submit_placement(player_id, pieces)
            .inspect_err(|err| self.rejected(player_id, "place", err))?;

        tracing::info!(code = %self.game.code(), %player_id, "fleet accepted");
        let mut events = vec![(Recipient::Player(player_id), ServerEvent::PlacementConfirmed)];
        if let PlacementOutcome::AllReady { first_turn } = outcome {
            for &pid in self.game.players() {
                events.push((
                    Recipient::Player(pid),
                    ServerEvent::AllReady {
                        current_turn: first_turn,
                        your_turn: pid == first_turn,
                    },
                ));
            }
        }
        self.dispatch(events);
        Ok(outcome)
    }

    fn handle_shoot(
        &mut self,
        player_id: PlayerId,
        cell: Coordinate,
    ) -> Result<AttackOutcome, MatchError> {
        let outcome = self
            .game
            .attack(player_id, cell)
            .inspect_err(|err| self.rejected(player_id, "shoot", err))?;

        let sunk = outcome.hit.sunk_piece.as_ref();
        let mut events = vec![
            (
                Recipient::Player(outcome.attacker),
                ServerEvent::ShotResult {
                    row: cell.row,
                    col: cell.col,
                    hit: outcome.hit.hit,
                    sunk: sunk.is_some(),
                    piece: sunk.map(|p| p.cells().to_vec()),
                },
            ),
            (
                Recipient::Player(outcome.defender),
                ServerEvent::OpponentShot {
                    row: cell.row,
                    col: cell.col,
                    hit: outcome.hit.hit,
                },
            ),
        ];

        match outcome.next_turn {
            Some(next) => {
                for &pid in self.game.players() {
                    events.push((
                        Recipient::Player(pid),
                        ServerEvent::TurnInfo {
                            your_turn: pid == next,
                        },
                    ));
                }
            }
            None => {
                tracing::info!(
                    code = %self.game.code(),
                    winner = %outcome.attacker,
                    "match finished"
                );
                for &pid in self.game.players() {
                    events.push((
                        Recipient::Player(pid),
                        ServerEvent::GameOver {
                            winner: outcome.attacker,
                            you_won: pid == outcome.attacker,
                        },
                    ));
                }
            }
        }

        self.dispatch(events);
        Ok(outcome)
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Option<usize> {
        let remaining = self.game.disconnect(player_id)?;
        self.senders.remove(&player_id);
        if remaining > 0 {
            self.dispatch(vec![(
                Recipient::AllExcept(player_id),
                ServerEvent::PlayerLeft {
                    message: "Opponent left the game".into(),
                },
            )]);
        }
        Some(remaining)
    }

    fn rejected(&self, player_id: PlayerId, intent: &str, err: &MatchError) {
        let code = self.game.code();
        if matches!(err, MatchError::UnknownPlayer(_)) {
            tracing::warn!(%code, %player_id, intent, "intent from a non-member");
            return;
        }
        tracing::debug!(%code, %player_id, intent, error = %err, "intent rejected");
    }

    /// Fans events out to the currently seated players.
    fn dispatch(&self, events: Vec<(Recipient, ServerEvent)>) {
        for (recipient, event) in events {
            match recipient {
                Recipient::All => {
                    for pid in self.game.players() {
                        self.send_to(*pid, event.clone());
                    }
                }
                Recipient::Player(pid) => self.send_to(pid, event),
                Recipient::AllExcept(excluded) => {
                    for pid in self.game.players() {
                        if *pid != excluded {
                            self.send_to(*pid, event.clone());
                        }
                    }
                }
            }
        }
    }

    /// Drops the event if the player's connection is gone.
    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(event);
        }
    }

    fn info(&self) -> MatchInfo {
        MatchInfo {
            code: self.game.code().clone(),
            phase: self.game.phase(),
            player_count: self.game.players().len(),
            turn: self.game.turn(),
            winner: self.game.winner(),
        }
    }
}

/// Spawns the actor for a new match with `creator` seated, and sends the
/// creator `lobbyCreated`.
pub(crate) fn spawn_match(
    code: LobbyCode,
    creator: PlayerId,
    sender: PlayerSender,
    config: &MatchConfig,
) -> MatchHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let _ = sender.send(ServerEvent::LobbyCreated {
        code: code.to_string(),
    });

    let actor = MatchActor {
        game: Match::new(code.clone(), creator, config.rules.clone()),
        senders: HashMap::from([(creator, sender)]),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    MatchHandle { code, sender: tx }
}
