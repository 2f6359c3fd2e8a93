//! Error types for the match layer.
//!
//! Every variant is a recoverable, user-facing rejection. A rejected
//! operation leaves all match state exactly as it was.

use std::collections::BTreeMap;

use broadside_protocol::{Coordinate, PlayerId};

use crate::{LobbyCode, MatchPhase};

/// Why a fleet was refused. Checks run in the order the variants are
/// listed and the first failure is reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("expected {expected} pieces, got {actual}")]
    WrongPieceCount { expected: usize, actual: usize },

    #[error("piece {index} has {length} cells; pieces have 1 to {max} cells")]
    InvalidLength {
        index: usize,
        length: usize,
        max: usize,
    },

    #[error("piece {index} has cell {cell} outside the board")]
    OutOfBounds { index: usize, cell: Coordinate },

    #[error("piece {index} is not a contiguous straight line")]
    NotALine { index: usize },

    #[error("fleet composition mismatch: expected {expected:?}, got {actual:?}")]
    FleetMismatch {
        /// Required count per piece length.
        expected: BTreeMap<usize, usize>,
        /// Submitted count per piece length.
        actual: BTreeMap<usize, usize>,
    },

    #[error("pieces {first} and {second} overlap at {cell}")]
    Overlap {
        first: usize,
        second: usize,
        cell: Coordinate,
    },

    #[error("pieces {first} and {second} touch")]
    Touching { first: usize, second: usize },
}

/// Why a [`RuleSet`](crate::RuleSet) cannot be played.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleSetError {
    #[error("grid size must be positive, got {0}")]
    GridSize(i32),

    #[error("fleet must contain at least one piece")]
    EmptyFleet,

    #[error("piece length must be at least 1 ({count} pieces of length 0)")]
    ZeroLength { count: usize },

    #[error("piece length {length} does not fit a {grid}x{grid} grid")]
    PieceTooLong { length: usize, grid: i32 },

    #[error("fleet needs {needed} cells but the grid has {available}")]
    FleetTooLarge { needed: usize, available: usize },

    /// Piece counts or lengths too large to add up.
    #[error("fleet size overflows")]
    Overflow,
}

/// Errors that can occur during match operations.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// No live match has this code (or the code is malformed).
    #[error("lobby {0} not found")]
    LobbyNotFound(String),

    /// Both seats are taken.
    #[error("lobby {0} is full")]
    LobbyFull(LobbyCode),

    /// The match has moved past the lobby phase and cannot be joined.
    #[error("lobby {0} is no longer open ({1})")]
    LobbyClosed(LobbyCode, MatchPhase),

    /// The player already sits in a match.
    #[error("player {0} is already in lobby {1}")]
    AlreadyInMatch(PlayerId, LobbyCode),

    #[error("invalid placement: {0}")]
    InvalidPlacement(#[from] PlacementError),

    /// The player's fleet was already accepted.
    #[error("player {0} has already placed a fleet")]
    AlreadyPlaced(PlayerId),

    /// Placement was submitted outside the placing phase.
    #[error("fleets can only be placed while placing, match is {0}")]
    NotPlacing(MatchPhase),

    /// The player is not a member of this match.
    #[error("player {0} is not in this match")]
    UnknownPlayer(PlayerId),

    #[error("it is not player {0}'s turn")]
    NotYourTurn(PlayerId),

    /// The cell was already attacked on this board.
    #[error("cell {0} was already attacked")]
    DuplicateAttack(Coordinate),

    /// The attacked cell is outside the board.
    #[error("cell {0} is outside the board")]
    OutOfBounds(Coordinate),

    /// The opponent has no board to attack (they left the match).
    #[error("opponent is not ready")]
    OpponentNotReady,

    /// Attacks are only accepted while playing.
    #[error("match is not in play ({0})")]
    MatchNotPlaying(MatchPhase),

    /// No unused lobby code could be generated.
    #[error("could not allocate a free lobby code")]
    CodeSpaceExhausted,

    /// The match actor has stopped or its command channel is closed.
    #[error("lobby {0} is unavailable")]
    Unavailable(LobbyCode),
}

impl MatchError {
    /// HTTP-style status reported to the client alongside the message.
    pub fn status(&self) -> u16 {
        match self {
            Self::LobbyNotFound(_) => 404,
            Self::UnknownPlayer(_) | Self::NotYourTurn(_) => 403,
            Self::InvalidPlacement(_) | Self::OutOfBounds(_) => 422,
            Self::CodeSpaceExhausted | Self::Unavailable(_) => 503,
            Self::LobbyFull(_)
            | Self::LobbyClosed(..)
            | Self::AlreadyInMatch(..)
            | Self::AlreadyPlaced(_)
            | Self::NotPlacing(_)
            | Self::DuplicateAttack(_)
            | Self::OpponentNotReady
            | Self::MatchNotPlaying(_) => 409,
        }
    }
}
