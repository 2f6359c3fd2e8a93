//! Lobby codes and their generation.

use std::fmt;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::MatchError;

/// Number of characters in a lobby code.
pub const CODE_LEN: usize = 6;

const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A 6-character uppercase alphanumeric match identifier.
///
/// Codes compare case-insensitively because [`LobbyCode::parse`] folds
/// every input to uppercase before it becomes a `LobbyCode`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LobbyCode(String);

impl LobbyCode {
    /// Parses a client-supplied code in any letter case.
    ///
    /// # Errors
    /// A malformed code cannot name a live match, so it is reported as
    /// [`MatchError::LobbyNotFound`].
    pub fn parse(input: &str) -> Result<Self, MatchError> {
        let valid = input.len() == CODE_LEN && input.bytes().all(|b| b.is_ascii_alphanumeric());
        if !valid {
            return Err(MatchError::LobbyNotFound(input.to_owned()));
        }
        Ok(Self(input.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LobbyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<LobbyCode> for String {
    fn from(code: LobbyCode) -> Self {
        code.0
    }
}

/// Source of candidate lobby codes.
///
/// Candidates need not be unique; the registry checks each one against
/// the live table and asks again on collision. Any `FnMut() -> LobbyCode`
/// closure is a generator, which is how tests script exact codes.
pub trait CodeGenerator: Send + Sync {
    fn next_code(&mut self) -> LobbyCode;
}

impl<F> CodeGenerator for F
where
    F: FnMut() -> LobbyCode + Send + Sync,
{
    fn next_code(&mut self) -> LobbyCode {
        self()
    }
}

/// Uniformly random codes over `[A-Z0-9]`.
pub struct RandomCodes {
    rng: SmallRng,
}

impl RandomCodes {
    /// Seeds from the operating system.
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Deterministic sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomCodes {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator for RandomCodes {
    fn next_code(&mut self) -> LobbyCode {
        let code = (0..CODE_LEN)
            .map(|_| char::from(ALPHABET[self.rng.random_range(0..ALPHABET.len())]))
            .collect();
        LobbyCode(code)
    }
}
