//! Core protocol types for Broadside's wire format.
//!
//! Every frame on the wire is a JSON object tagged by `"type"`. The tag
//! names and field names are camelCase so browser clients can switch on
//! them directly:
//!
//! ```text
//! → {"type":"shoot","code":"K3Q9ZD","row":4,"col":7}
//! ← {"seq":12,"timestamp":48211,"type":"shotResult","row":4,"col":7,"hit":true,"sunk":false}
//! ```

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity and value types
// ---------------------------------------------------------------------------

/// Opaque identity of a player, assigned by the session gateway.
///
/// Serialized as a plain number (`#[serde(transparent)]`). The match layer
/// compares these for equality and never looks inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A cell on the board, `(row, col)`.
///
/// Signed on purpose: the wire accepts any integer, and bounds are a
/// rule-set question answered by the grid module, not by the type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coordinate {
    pub row: i32,
    pub col: i32,
}

impl Coordinate {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who should receive a server event.
///
/// The match layer pairs every outbound [`ServerEvent`] with one of these;
/// the actor resolves it against the current member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player currently in the match.
    All,

    /// One specific player.
    Player(PlayerId),

    /// Every player in the match except this one.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Inbound intents
// ---------------------------------------------------------------------------

/// What a client asks the server to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientIntent {
    /// Open a new lobby with the sender as its first player.
    CreateLobby,

    /// Join an existing lobby by its shareable code.
    JoinLobby { code: String },

    /// Submit the whole fleet. Each inner list is one piece's cells.
    PlaceShips {
        code: String,
        ships: Vec<Vec<Coordinate>>,
    },

    /// Fire at one cell of the opponent's board.
    Shoot { code: String, row: i32, col: i32 },

    /// Leave the lobby without closing the connection.
    LeaveLobby { code: String },
}

impl ClientIntent {
    /// The wire tag of this intent, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateLobby => "createLobby",
            Self::JoinLobby { .. } => "joinLobby",
            Self::PlaceShips { .. } => "placeShips",
            Self::Shoot { .. } => "shoot",
            Self::LeaveLobby { .. } => "leaveLobby",
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound events
// ---------------------------------------------------------------------------

/// What the server tells a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Sent once per connection: the identity `currentTurn` and `winner`
    /// refer to.
    Welcome { player_id: PlayerId },

    LobbyCreated { code: String },

    LobbyJoined { code: String },

    /// A create/join request was refused (unknown code, full lobby, ...).
    LobbyError { message: String },

    PlayerJoined { player_count: usize },

    /// Both seats are taken; placement begins.
    GameStart { your_turn: bool, message: String },

    PlacementConfirmed,

    PlacementError { message: String },

    /// Both fleets are accepted; `current_turn` fires first.
    AllReady {
        current_turn: PlayerId,
        your_turn: bool,
    },

    /// Sent to the attacker. `piece` carries the sunk piece's cells.
    ShotResult {
        row: i32,
        col: i32,
        hit: bool,
        sunk: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        piece: Option<Vec<Coordinate>>,
    },

    /// Sent to the defender.
    OpponentShot { row: i32, col: i32, hit: bool },

    TurnInfo { your_turn: bool },

    GameOver { winner: PlayerId, you_won: bool },

    /// A rejected intent. `code` is an HTTP-style status.
    Error { code: u16, message: String },

    /// The other player is gone; the match will not continue.
    PlayerLeft { message: String },
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The frame wrapper. The payload's fields sit next to `seq` and
/// `timestamp` in the same JSON object (`#[serde(flatten)]`).
///
/// Clients may omit `seq` and `timestamp`; they default to 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Per-connection sequence number of outbound frames.
    #[serde(default)]
    pub seq: u64,

    /// Milliseconds since the connection was opened.
    #[serde(default)]
    pub timestamp: u64,

    #[serde(flatten)]
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(seq: u64, timestamp: u64, payload: T) -> Self {
        Self {
            seq,
            timestamp,
            payload,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
