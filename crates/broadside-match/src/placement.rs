//! Pieces and the placement validator.
//!
//! [`validate`] is a pure predicate over a whole submitted fleet. It does
//! not look at any board; the board only ever receives fleets that passed.

use std::collections::HashMap;

use broadside_protocol::Coordinate;
use serde::{Deserialize, Serialize};

use crate::grid;
use crate::{PlacementError, RuleSet};

/// One ship: an ordered run of cells.
///
/// Constructing a `Piece` does not check anything; a piece is only known
/// to be a straight, in-bounds line once its fleet passed [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Piece(Vec<Coordinate>);

impl Piece {
    pub fn new(cells: Vec<Coordinate>) -> Self {
        Self(cells)
    }

    pub fn cells(&self) -> &[Coordinate] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, cell: Coordinate) -> bool {
        self.0.contains(&cell)
    }
}

impl From<Vec<Coordinate>> for Piece {
    fn from(cells: Vec<Coordinate>) -> Self {
        Self(cells)
    }
}

/// Decides whether `pieces` is a legal fleet under `rules`.
///
/// Checks, first failure wins:
/// 1. the number of pieces matches the fleet size;
/// 2. every piece has 1..=max cells, all on the board, in a straight
///    contiguous line;
/// 3. the multiset of piece lengths equals the fleet composition;
/// 4. no two pieces share a cell;
/// 5. no two pieces touch, diagonally included.
pub fn validate(pieces: &[Piece], rules: &RuleSet) -> Result<(), PlacementError> {
    let expected = rules.piece_count();
    if pieces.len() != expected {
        return Err(PlacementError::WrongPieceCount {
            expected,
            actual: pieces.len(),
        });
    }

    let max = rules.max_piece_length();
    for (index, piece) in pieces.iter().enumerate() {
        if piece.is_empty() || piece.len() > max {
            return Err(PlacementError::InvalidLength {
                index,
                length: piece.len(),
                max,
            });
        }
        if let Some(&cell) = piece
            .cells()
            .iter()
            .find(|c| !grid::in_bounds(**c, rules.grid_size))
        {
            return Err(PlacementError::OutOfBounds { index, cell });
        }
        if !grid::is_contiguous_line(piece.cells()) {
            return Err(PlacementError::NotALine { index });
        }
    }

    let expected = rules.length_histogram();
    let mut actual = std::collections::BTreeMap::new();
    for piece in pieces {
        *actual.entry(piece.len()).or_insert(0) += 1;
    }
    if actual != expected {
        return Err(PlacementError::FleetMismatch { expected, actual });
    }

    let mut owner: HashMap<Coordinate, usize> = HashMap::new();
    for (index, piece) in pieces.iter().enumerate() {
        for &cell in piece.cells() {
            if let Some(&first) = owner.get(&cell) {
                return Err(PlacementError::Overlap {
                    first,
                    second: index,
                    cell,
                });
            }
            owner.insert(cell, index);
        }
    }

    for (first, a) in pieces.iter().enumerate() {
        for (second, b) in pieces.iter().enumerate().skip(first + 1) {
            let touching = a.cells().iter().any(|&ca| {
                b.cells().iter().any(|&cb| grid::is_adjacent_or_same(ca, cb))
            });
            if touching {
                return Err(PlacementError::Touching { first, second });
            }
        }
    }

    Ok(())
}
