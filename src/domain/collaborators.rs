//! Contracts of the modules the murder domain depends on.
//!
//! Players, locations and game rounds are owned elsewhere; the murder
//! domain only needs the lookups below. Achievement recomputation is a
//! fire-and-forget side effect injected as an [`AchievementNotifier`].

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{GameId, LocationId, PlayerId};
use crate::error::TrackerError;

/// A participant of a game round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Player {
    /// Player identifier.
    pub id: PlayerId,
    /// Game round the player is registered in.
    pub game: GameId,
    /// Display name.
    pub name: String,
    /// Secret kill code handed to whoever kills this player.
    #[serde(skip_serializing)]
    pub code: String,
    /// Set by an administrator to take a player out of the game.
    pub disabled: bool,
}

/// A named place on the game map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    /// Location identifier.
    pub id: LocationId,
    /// Display name.
    pub name: String,
    /// Latitude, if the place was pinned on the map.
    pub lat: Option<f64>,
    /// Longitude, if the place was pinned on the map.
    pub lng: Option<f64>,
}

/// Free-text location entered together with a kill.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct NewLocation {
    /// Display name.
    pub name: String,
    /// Latitude, if known.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude, if known.
    #[serde(default)]
    pub lng: Option<f64>,
}

impl NewLocation {
    /// Returns the location only if it carries a non-blank name.
    #[must_use]
    pub fn named(self) -> Option<Self> {
        if self.name.trim().is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// Identity of a game round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GameRound {
    /// Game identifier.
    pub id: GameId,
    /// Year the round is played in.
    pub year: i32,
    /// Sequence number of the round within its year.
    pub number: i32,
}

/// Read access to players.
#[async_trait]
pub trait PlayerDirectory: Send + Sync + Debug {
    /// Looks a player up by id.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if the backing store fails.
    async fn find(&self, id: PlayerId) -> Result<Option<Player>, TrackerError>;

    /// Looks a player up by their kill code.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if the backing store fails.
    async fn find_by_code(&self, code: &str) -> Result<Option<Player>, TrackerError>;

    /// Returns `true` if the player is disabled or has already been killed.
    /// Unknown players are not dead.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if the backing store fails.
    async fn is_dead(&self, id: PlayerId) -> Result<bool, TrackerError>;

    /// Lists players, optionally restricted to one game and to the living
    /// (`Some(false)`) or the dead (`Some(true)`).
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if the backing store fails.
    async fn list(
        &self,
        game: Option<GameId>,
        death: Option<bool>,
    ) -> Result<Vec<Player>, TrackerError>;

    /// Counts every player registered in `game`, dead or alive.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if the backing store fails.
    async fn count(&self, game: GameId) -> Result<i64, TrackerError>;
}

/// Access to kill locations.
#[async_trait]
pub trait LocationDirectory: Send + Sync + Debug {
    /// Stores a new location and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if the backing store fails.
    async fn add(&self, location: NewLocation) -> Result<Location, TrackerError>;

    /// Lists every known location.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if the backing store fails.
    async fn list(&self) -> Result<Vec<Location>, TrackerError>;
}

/// Access to game rounds.
#[async_trait]
pub trait GameDirectory: Send + Sync + Debug {
    /// Returns the most recent game round, if any exists.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if the backing store fails.
    async fn latest(&self) -> Result<Option<GameRound>, TrackerError>;
}

/// Hooks asking the achievement module to recompute progress.
///
/// Calls never fail from the caller's point of view.
pub trait AchievementNotifier: Send + Sync + Debug {
    /// Recomputes achievement progress of one player.
    fn selected_progress(&self, game: GameId, player: PlayerId);

    /// Recomputes achievement progress of every player in `game`.
    fn total_progress(&self, game: GameId);
}
