//! Match registry: creates, tracks, and routes players to matches.

use std::collections::HashMap;

use broadside_protocol::PlayerId;

use crate::actor::spawn_match;
use crate::{CodeGenerator, LobbyCode, MatchConfig, MatchError, MatchHandle, PlayerSender, RandomCodes};

/// Candidate codes tried before giving up on a collision-free one.
const MAX_CODE_ATTEMPTS: usize = 64;

/// Every live match, and which match each player sits in.
///
/// A player is in at most one match at a time. The registry is an
/// ordinary value: the server keeps one behind a mutex, tests build a
/// fresh one each.
pub struct MatchRegistry {
    matches: HashMap<LobbyCode, MatchHandle>,

    /// Kept in sync with the seats of every match in `matches`.
    player_matches: HashMap<PlayerId, LobbyCode>,

    config: MatchConfig,
    codes: Box<dyn CodeGenerator>,
}

impl MatchRegistry {
    /// Creates an empty registry drawing random lobby codes.
    pub fn new(config: MatchConfig) -> Self {
        Self::with_codes(config, RandomCodes::new())
    }

    /// Creates an empty registry with a custom code source.
    pub fn with_codes(config: MatchConfig, codes: impl CodeGenerator + 'static) -> Self {
        Self {
            matches: HashMap::new(),
            player_matches: HashMap::new(),
            config,
            codes: Box::new(codes),
        }
    }

    /// Opens a new lobby with `player_id` seated and returns its code.
    /// The creator receives `lobbyCreated` on `sender`.
    ///
    /// # Errors
    /// - [`MatchError::AlreadyInMatch`] if the player sits in a match.
    /// - [`MatchError::CodeSpaceExhausted`] if no unused code was found.
    pub fn create(
        &mut self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<LobbyCode, MatchError> {
        if let Some(current) = self.player_matches.get(&player_id) {
            return Err(MatchError::AlreadyInMatch(player_id, current.clone()));
        }

        let code = self.fresh_code()?;
        let handle = spawn_match(code.clone(), player_id, sender, &self.config);
        self.matches.insert(code.clone(), handle);
        self.player_matches.insert(player_id, code.clone());

        tracing::info!(%code, creator = %player_id, "match created");
        Ok(code)
    }

    /// Seats `player_id` in the match named by `code` (any letter case).
    ///
    /// Shorthand for [`admit`](Self::admit), [`MatchHandle::join`] and
    /// [`seat`](Self::seat). It borrows the registry across the actor
    /// call; a registry shared behind a lock should run those three
    /// steps itself and release the lock around the middle one.
    pub async fn join(
        &mut self,
        code: &str,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<MatchHandle, MatchError> {
        let handle = self.admit(code, player_id)?;
        handle.join(player_id, sender).await?;
        self.seat(player_id, &handle)?;
        Ok(handle)
    }

    /// First step of a join: checks that `player_id` is free and returns
    /// the handle of the match named by `code`. Records nothing.
    pub fn admit(&self, code: &str, player_id: PlayerId) -> Result<MatchHandle, MatchError> {
        if let Some(current) = self.player_matches.get(&player_id) {
            return Err(MatchError::AlreadyInMatch(player_id, current.clone()));
        }
        self.get(code)
    }

    /// Last step of a join: records that the actor behind `handle` seated
    /// `player_id`.
    ///
    /// # Errors
    /// [`MatchError::Unavailable`] if that match was destroyed in the
    /// meantime.
    pub fn seat(&mut self, player_id: PlayerId, handle: &MatchHandle) -> Result<(), MatchError> {
        if !self.is_live(handle) {
            return Err(MatchError::Unavailable(handle.code().clone()));
        }
        self.player_matches.insert(player_id, handle.code().clone());
        Ok(())
    }

    /// Looks up a live match by code (any letter case).
    pub fn get(&self, code: &str) -> Result<MatchHandle, MatchError> {
        let parsed = LobbyCode::parse(code)?;
        self.matches
            .get(&parsed)
            .cloned()
            .ok_or_else(|| MatchError::LobbyNotFound(code.to_owned()))
    }

    /// Forgets a match and its players and tells its actor to stop.
    pub fn remove(&mut self, code: &LobbyCode) -> Result<(), MatchError> {
        let handle = self
            .matches
            .remove(code)
            .ok_or_else(|| MatchError::LobbyNotFound(code.to_string()))?;

        handle.close();
        self.player_matches.retain(|_, c| *c != *code);

        tracing::info!(%code, "match destroyed");
        Ok(())
    }

    /// Removes the match behind `handle` if it is still registered.
    /// A newer match that reused the code is left alone.
    pub fn retire(&mut self, handle: &MatchHandle) {
        if self.is_live(handle) {
            let _ = self.remove(handle.code());
        }
    }

    /// Takes `player_id` out of their match, destroying it when nobody is
    /// left. Returns the code they left, or `None` if they were in no
    /// match. Repeating the call is a no-op.
    ///
    /// Like [`join`](Self::join) this borrows the registry across the
    /// actor call; the lock-friendly steps are [`unseat`](Self::unseat),
    /// [`MatchHandle::vacate`] and [`retire`](Self::retire).
    pub async fn leave(&mut self, player_id: PlayerId) -> Result<Option<LobbyCode>, MatchError> {
        let Some((code, handle)) = self.unseat(player_id) else {
            return Ok(None);
        };
        if let Some(handle) = handle {
            if handle.vacate(player_id).await? {
                self.retire(&handle);
            }
        }
        Ok(Some(code))
    }

    /// First step of a leave: forgets which match `player_id` sits in.
    /// Returns that code and, if the match is still live, its handle.
    pub fn unseat(&mut self, player_id: PlayerId) -> Option<(LobbyCode, Option<MatchHandle>)> {
        let code = self.player_matches.remove(&player_id)?;
        let handle = self.matches.get(&code).cloned();
        Some((code, handle))
    }

    /// The code of the match `player_id` sits in, if any.
    pub fn match_of(&self, player_id: &PlayerId) -> Option<&LobbyCode> {
        self.player_matches.get(player_id)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Codes of every live match.
    pub fn codes(&self) -> Vec<LobbyCode> {
        self.matches.keys().cloned().collect()
    }

    fn is_live(&self, handle: &MatchHandle) -> bool {
        self.matches
            .get(handle.code())
            .is_some_and(|live| live.same_match(handle))
    }

    fn fresh_code(&mut self) -> Result<LobbyCode, MatchError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = self.codes.next_code();
            if !self.matches.contains_key(&code) {
                return Ok(code);
            }
            tracing::debug!(%code, "lobby code collision, retrying");
        }
        Err(MatchError::CodeSpaceExhausted)
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}
