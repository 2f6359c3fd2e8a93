//! One player's board: the accepted fleet plus the attacks it has taken.

use std::collections::HashSet;

use broadside_protocol::{Coordinate, PlayerId};

use crate::{MatchError, Piece};

/// Result of resolving a single attack against a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitOutcome {
    pub hit: bool,
    /// The piece this attack completed, if any.
    pub sunk_piece: Option<Piece>,
    /// Every piece on the board is now sunk.
    pub defeated: bool,
}

/// Fleet and attack history for one player.
///
/// `pieces` is written once by [`BoardState::accept`]. `attacks` only
/// grows, and never holds the same coordinate twice.
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    pieces: Option<Vec<Piece>>,
    attacks: Vec<(Coordinate, bool)>,
    /// Cells in `attacks`, for O(1) duplicate checks.
    attacked: HashSet<Coordinate>,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an already validated fleet.
    ///
    /// # Errors
    /// [`MatchError::AlreadyPlaced`] if a fleet was accepted before.
    pub fn accept(&mut self, owner: PlayerId, pieces: Vec<Piece>) -> Result<(), MatchError> {
        if self.pieces.is_some() {
            return Err(MatchError::AlreadyPlaced(owner));
        }
        self.pieces = Some(pieces);
        Ok(())
    }

    pub fn is_placed(&self) -> bool {
        self.pieces.is_some()
    }

    pub fn pieces(&self) -> &[Piece] {
        self.pieces.as_deref().unwrap_or(&[])
    }

    pub fn attacks(&self) -> &[(Coordinate, bool)] {
        &self.attacks
    }

    pub fn was_attacked(&self, cell: Coordinate) -> bool {
        self.attacked.contains(&cell)
    }

    /// Resolves an attack on `cell` and appends it to the history.
    ///
    /// # Errors
    /// [`MatchError::DuplicateAttack`] if `cell` was attacked before. The
    /// board is unchanged in that case.
    pub fn record_attack(&mut self, cell: Coordinate) -> Result<HitOutcome, MatchError> {
        if self.was_attacked(cell) {
            return Err(MatchError::DuplicateAttack(cell));
        }
        self.attacked.insert(cell);

        let struck = self.pieces().iter().position(|p| p.contains(cell));
        self.attacks.push((cell, struck.is_some()));

        let sunk_piece = struck
            .map(|i| &self.pieces()[i])
            .filter(|piece| self.is_sunk(piece))
            .cloned();

        Ok(HitOutcome {
            hit: struck.is_some(),
            sunk_piece,
            defeated: self.is_defeated(),
        })
    }

    /// Every cell of `piece` has taken a hit.
    pub fn is_sunk(&self, piece: &Piece) -> bool {
        piece.cells().iter().all(|c| self.attacked.contains(c))
    }

    /// A placed fleet with every piece sunk. An unplaced board is never
    /// defeated.
    pub fn is_defeated(&self) -> bool {
        match &self.pieces {
            Some(pieces) => pieces.iter().all(|p| self.is_sunk(p)),
            None => false,
        }
    }
}
