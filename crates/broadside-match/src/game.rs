//! The match state machine.
//!
//! `Match` is plain synchronous state. It knows nothing about channels or
//! tasks; the actor in [`crate::actor`] owns one and turns its outcomes
//! into events. Every method either commits a full transition or returns
//! an error with the match untouched.

use std::collections::HashMap;

use broadside_protocol::{Coordinate, PlayerId};

use crate::board::{BoardState, HitOutcome};
use crate::grid;
use crate::placement::{self, Piece};
use crate::{LobbyCode, MatchError, MatchPhase, RuleSet};

/// Seats per match.
pub const MAX_PLAYERS: usize = 2;

/// What a successful [`Match::join`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    pub player_count: usize,
    /// Phase after the join; `Placing` once both seats are filled.
    pub phase: MatchPhase,
}

/// What a successful [`Match::submit_placement`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// Fleet stored; the opponent has not placed yet.
    Waiting,
    /// Both fleets are in and play has begun.
    AllReady { first_turn: PlayerId },
}

/// A resolved attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackOutcome {
    pub attacker: PlayerId,
    pub defender: PlayerId,
    pub cell: Coordinate,
    pub hit: HitOutcome,
    /// Who attacks next, or `None` when this attack ended the match.
    pub next_turn: Option<PlayerId>,
}

impl AttackOutcome {
    pub fn is_game_over(&self) -> bool {
        self.hit.defeated
    }
}

/// One two-player game from lobby to result.
#[derive(Debug)]
pub struct Match {
    code: LobbyCode,
    rules: RuleSet,
    /// Join order. `players[0]` attacks first.
    players: Vec<PlayerId>,
    phase: MatchPhase,
    /// Present only for players whose fleet was accepted.
    boards: HashMap<PlayerId, BoardState>,
    turn: Option<PlayerId>,
    winner: Option<PlayerId>,
}

impl Match {
    /// Opens a lobby with `creator` in the first seat.
    pub fn new(code: LobbyCode, creator: PlayerId, rules: RuleSet) -> Self {
        Self {
            code,
            rules,
            players: vec![creator],
            phase: MatchPhase::Waiting,
            boards: HashMap::new(),
            turn: None,
            winner: None,
        }
    }

    pub fn code(&self) -> &LobbyCode {
        &self.code
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn turn(&self) -> Option<PlayerId> {
        self.turn
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn is_member(&self, player_id: PlayerId) -> bool {
        self.players.contains(&player_id)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn board(&self, player_id: PlayerId) -> Option<&BoardState> {
        self.boards.get(&player_id)
    }

    /// The other seated player, if there is one.
    pub fn opponent_of(&self, player_id: PlayerId) -> Option<PlayerId> {
        if !self.is_member(player_id) {
            return None;
        }
        self.players.iter().copied().find(|p| *p != player_id)
    }

    /// Seats a second player.
    ///
    /// # Errors
    /// - [`MatchError::AlreadyInMatch`] if the player is already seated.
    /// - [`MatchError::LobbyFull`] if both seats are taken.
    /// - [`MatchError::LobbyClosed`] if the match left `waiting` and a seat
    ///   has since emptied.
    pub fn join(&mut self, player_id: PlayerId) -> Result<JoinOutcome, MatchError> {
        if self.is_member(player_id) {
            return Err(MatchError::AlreadyInMatch(player_id, self.code.clone()));
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(MatchError::LobbyFull(self.code.clone()));
        }
        if !self.phase.is_joinable() {
            return Err(MatchError::LobbyClosed(self.code.clone(), self.phase));
        }

        self.players.push(player_id);
        if self.players.len() == MAX_PLAYERS {
            self.advance(MatchPhase::Placing);
        }

        Ok(JoinOutcome {
            player_count: self.players.len(),
            phase: self.phase,
        })
    }

    /// Validates and stores a player's fleet. Play starts once every
    /// seated player has a board and both seats are filled.
    pub fn submit_placement(
        &mut self,
        player_id: PlayerId,
        pieces: Vec<Piece>,
    ) -> Result<PlacementOutcome, MatchError> {
        if self.phase != MatchPhase::Placing {
            return Err(MatchError::NotPlacing(self.phase));
        }
        if !self.is_member(player_id) {
            return Err(MatchError::UnknownPlayer(player_id));
        }
        if self.boards.get(&player_id).is_some_and(BoardState::is_placed) {
            return Err(MatchError::AlreadyPlaced(player_id));
        }

        placement::validate(&pieces, &self.rules)?;

        let mut board = BoardState::new();
        board.accept(player_id, pieces)?;
        self.boards.insert(player_id, board);

        let all_ready = self.players.len() == MAX_PLAYERS
            && self.players.iter().all(|p| self.boards.contains_key(p));
        if !all_ready {
            return Ok(PlacementOutcome::Waiting);
        }

        let first_turn = self.players[0];
        self.turn = Some(first_turn);
        self.advance(MatchPhase::Playing);
        Ok(PlacementOutcome::AllReady { first_turn })
    }

    /// Fires at `cell` on the opponent's board.
    ///
    /// Sinking a piece keeps the turn; any other result passes it. An
    /// attack that defeats the opponent finishes the match with the
    /// attacker as winner.
    pub fn attack(
        &mut self,
        player_id: PlayerId,
        cell: Coordinate,
    ) -> Result<AttackOutcome, MatchError> {
        if self.phase != MatchPhase::Playing {
            return Err(MatchError::MatchNotPlaying(self.phase));
        }
        if !self.is_member(player_id) {
            return Err(MatchError::UnknownPlayer(player_id));
        }
        // A departed opponent may still hold the turn; report the
        // missing opponent rather than a turn nobody can take.
        let defender = self
            .opponent_of(player_id)
            .filter(|d| self.boards.contains_key(d))
            .ok_or(MatchError::OpponentNotReady)?;
        if self.turn != Some(player_id) {
            return Err(MatchError::NotYourTurn(player_id));
        }
        if !grid::in_bounds(cell, self.rules.grid_size) {
            return Err(MatchError::OutOfBounds(cell));
        }
        let board = self
            .boards
            .get_mut(&defender)
            .ok_or(MatchError::OpponentNotReady)?;

        let hit = board.record_attack(cell)?;

        let next_turn = if hit.defeated {
            self.winner = Some(player_id);
            self.advance(MatchPhase::Finished);
            None
        } else if hit.sunk_piece.is_some() {
            Some(player_id)
        } else {
            self.turn = Some(defender);
            Some(defender)
        };

        Ok(AttackOutcome {
            attacker: player_id,
            defender,
            cell,
            hit,
            next_turn,
        })
    }

    /// Removes a player. Returns the number still seated, or `None` if the
    /// player was not in the match (a repeated disconnect is a no-op).
    ///
    /// Phase, turn and boards are left as they are; a match with one
    /// player cannot progress further.
    pub fn disconnect(&mut self, player_id: PlayerId) -> Option<usize> {
        let index = self.players.iter().position(|p| *p == player_id)?;
        self.players.remove(index);
        tracing::info!(
            code = %self.code,
            %player_id,
            remaining = self.players.len(),
            "player left match"
        );
        Some(self.players.len())
    }

    fn advance(&mut self, to: MatchPhase) {
        debug_assert!(self.phase.can_transition_to(to), "{} -> {to}", self.phase);
        tracing::info!(code = %self.code, from = %self.phase, %to, "match phase changed");
        self.phase = to;
    }
}
