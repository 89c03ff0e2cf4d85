//! Persistence layer: the murder repository and its backends.
//!
//! [`MurderStore`] is the repository contract. [`postgres::PostgresStore`]
//! is the production backend; [`memory::InMemoryStore`] enforces the same
//! constraints in process and backs tests and local runs. Both backends
//! also serve the player, location and game lookups the domain needs.

pub mod memory;
pub mod postgres;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::{
    GameId, Location, Murder, MurderFilter, MurderId, MurderListing, NewLocation, NewMurder,
};
use crate::error::TrackerError;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Repository of murder records.
///
/// Implementations enforce that at most one record exists per
/// `(murderer, victim)` pair and that game, players and location refer to
/// existing rows.
#[async_trait]
pub trait MurderStore: Send + Sync + Debug {
    /// Inserts a new record and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::DuplicateKill`] if the pair was already
    /// logged and [`TrackerError::ConstraintViolation`] if a referenced
    /// game, player or location does not exist.
    async fn add(&self, murder: NewMurder) -> Result<Murder, TrackerError>;

    /// Stores a free-text location and a record placed there as one unit.
    /// `murder.location` is ignored and replaced by the new location's id.
    /// When the record is refused the location is not kept either.
    ///
    /// # Errors
    ///
    /// Same as [`MurderStore::add`].
    async fn add_at_new_location(
        &self,
        murder: NewMurder,
        location: NewLocation,
    ) -> Result<(Murder, Location), TrackerError>;

    /// Fetches one record of `game`.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if the backing store fails.
    async fn get(&self, id: MurderId, game: GameId) -> Result<Option<Murder>, TrackerError>;

    /// Deletes a record.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MurderNotFound`] if the record no longer
    /// exists.
    async fn delete(&self, murder: &Murder) -> Result<(), TrackerError>;

    /// Lists records matching `filter`, joined with player and location
    /// display fields, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if the backing store fails.
    async fn list(&self, filter: &MurderFilter) -> Result<Vec<MurderListing>, TrackerError>;

    /// Counts the records of `game`.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if the backing store fails.
    async fn count(&self, game: GameId) -> Result<i64, TrackerError>;

    /// Returns the earliest inserted record of `game`.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if the backing store fails.
    async fn first_kill(&self, game: GameId) -> Result<Option<Murder>, TrackerError>;
}
