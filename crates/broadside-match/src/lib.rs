//! Match coordination for Broadside.
//!
//! Each match runs as an isolated Tokio task (actor model) that owns the
//! two boards and the turn pointer. Everything below the actor is plain
//! synchronous code.
//!
//! # Key types
//!
//! - [`MatchRegistry`]: creates and destroys matches, routes players
//! - [`MatchHandle`]: send commands to a running match actor
//! - [`Match`]: the turn state machine itself
//! - [`RuleSet`]: grid size and fleet composition
//! - [`validate`]: the placement validator

mod actor;
mod board;
mod code;
mod config;
mod error;
mod game;
pub mod grid;
mod placement;
mod registry;

pub use actor::{MatchHandle, MatchInfo, PlayerSender};
pub use board::{BoardState, HitOutcome};
pub use code::{CODE_LEN, CodeGenerator, LobbyCode, RandomCodes};
pub use config::{FleetRule, MatchConfig, MatchPhase, RuleSet};
pub use error::{MatchError, PlacementError, RuleSetError};
pub use game::{AttackOutcome, JoinOutcome, MAX_PLAYERS, Match, PlacementOutcome};
pub use placement::{Piece, validate};
pub use registry::MatchRegistry;
