//! Rule set, match configuration, and the match phase state machine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::RuleSetError;

// ---------------------------------------------------------------------------
// RuleSet
// ---------------------------------------------------------------------------

/// How many pieces of one length a fleet contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetRule {
    pub length: usize,
    pub count: usize,
}

/// Board size and fleet composition.
///
/// The classic rules are a 10×10 grid and the fleet `{4:1, 3:2, 2:3, 1:4}`.
/// Everything that checks a placement reads these numbers from here, so an
/// alternate rule set can be loaded from JSON without code changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Side length of the square grid. Valid rows and columns are
    /// `0..grid_size`.
    pub grid_size: i32,

    /// Required pieces, longest first by convention.
    pub fleet: Vec<FleetRule>,
}

impl RuleSet {
    /// The classic 10×10 rules with ten pieces.
    pub fn classic() -> Self {
        Self {
            grid_size: 10,
            fleet: vec![
                FleetRule { length: 4, count: 1 },
                FleetRule { length: 3, count: 2 },
                FleetRule { length: 2, count: 3 },
                FleetRule { length: 1, count: 4 },
            ],
        }
    }

    /// Total number of pieces in a fleet. Saturates at `usize::MAX`.
    pub fn piece_count(&self) -> usize {
        self.fleet
            .iter()
            .try_fold(0usize, |acc, r| acc.checked_add(r.count))
            .unwrap_or(usize::MAX)
    }

    /// Total number of cells a full fleet occupies. Saturates at
    /// `usize::MAX`.
    pub fn occupied_cells(&self) -> usize {
        self.checked_occupied_cells().unwrap_or(usize::MAX)
    }

    /// Length of the longest allowed piece.
    pub fn max_piece_length(&self) -> usize {
        self.fleet.iter().map(|r| r.length).max().unwrap_or(0)
    }

    /// Required number of pieces per length. Lengths listed more than
    /// once are summed.
    pub fn length_histogram(&self) -> BTreeMap<usize, usize> {
        let mut histogram = BTreeMap::new();
        for rule in &self.fleet {
            let count = histogram.entry(rule.length).or_insert(0usize);
            *count = count.saturating_add(rule.count);
        }
        histogram
    }

    /// Checks that the rule set describes a playable game.
    pub fn check(&self) -> Result<(), RuleSetError> {
        if self.grid_size <= 0 {
            return Err(RuleSetError::GridSize(self.grid_size));
        }
        if self.piece_count() == 0 {
            return Err(RuleSetError::EmptyFleet);
        }
        if let Some(rule) = self.fleet.iter().find(|r| r.length == 0) {
            return Err(RuleSetError::ZeroLength { count: rule.count });
        }
        let side = self.grid_size as usize;
        if self.max_piece_length() > side {
            return Err(RuleSetError::PieceTooLong {
                length: self.max_piece_length(),
                grid: self.grid_size,
            });
        }
        let needed = self.checked_occupied_cells().ok_or(RuleSetError::Overflow)?;
        let available = side.checked_mul(side).unwrap_or(usize::MAX);
        if needed > available {
            return Err(RuleSetError::FleetTooLarge { needed, available });
        }
        Ok(())
    }

    fn checked_occupied_cells(&self) -> Option<usize> {
        self.fleet.iter().try_fold(0usize, |acc, r| {
            r.length.checked_mul(r.count).and_then(|cells| acc.checked_add(cells))
        })
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::classic()
    }
}

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Settings shared by every match a registry creates.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Board and fleet rules.
    pub rules: RuleSet,

    /// Capacity of each match actor's command channel. Senders wait when
    /// it is full. Zero is treated as 1.
    pub channel_size: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            rules: RuleSet::classic(),
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// MatchPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a match.
///
/// Monotonic, one step at a time:
///
/// ```text
/// Waiting → Placing → Playing → Finished
/// ```
///
/// - **Waiting**: one player, lobby open for a second.
/// - **Placing**: two players, each submitting a fleet.
/// - **Playing**: both fleets accepted, players alternate attacks.
/// - **Finished**: one board is defeated; `winner` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPhase {
    Waiting,
    Placing,
    Playing,
    Finished,
}

impl MatchPhase {
    /// Returns `true` if the lobby still accepts a second player.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// The phase that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Placing),
            Self::Placing => Some(Self::Playing),
            Self::Playing => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if moving to `target` is a legal single step.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Placing => write!(f, "placing"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}
