//! In-process backend with the same constraints as the SQL schema.
//!
//! All tables live behind a single [`tokio::sync::RwLock`], so every
//! operation sees a consistent snapshot and the `(murderer, victim)` check
//! and the insert happen atomically.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::MurderStore;
use crate::domain::{
    GameDirectory, GameId, GameRound, Location, LocationDirectory, LocationId, Murder,
    MurderFilter, MurderId, MurderListing, NewLocation, NewMurder, Player, PlayerDirectory,
    PlayerId,
};
use crate::error::TrackerError;

#[derive(Debug, Default)]
struct Tables {
    games: Vec<GameRound>,
    players: Vec<Player>,
    locations: Vec<Location>,
    murders: Vec<Murder>,
    last_murder_id: i64,
    last_location_id: i64,
}

impl Tables {
    fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    fn is_dead(&self, player: &Player) -> bool {
        player.disabled || self.murders.iter().any(|m| m.victim == player.id)
    }

    fn check_references(&self, murder: &NewMurder) -> Result<(), TrackerError> {
        if !self.games.iter().any(|g| g.id == murder.game) {
            return Err(TrackerError::ConstraintViolation(format!(
                "unknown game {}",
                murder.game
            )));
        }
        for player in [murder.murderer, murder.victim] {
            if self.player(player).is_none() {
                return Err(TrackerError::ConstraintViolation(format!(
                    "unknown player {player}"
                )));
            }
        }
        if let Some(location) = murder.location
            && self.location(location).is_none()
        {
            return Err(TrackerError::ConstraintViolation(format!(
                "unknown location {location}"
            )));
        }
        Ok(())
    }

    fn insert_location(&mut self, location: NewLocation) -> Location {
        self.last_location_id = self.last_location_id.saturating_add(1);
        let stored = Location {
            id: LocationId::new(self.last_location_id),
            name: location.name,
            lat: location.lat,
            lng: location.lng,
        };
        self.locations.push(stored.clone());
        stored
    }

    fn check_murder(&self, murder: &NewMurder) -> Result<(), TrackerError> {
        self.check_references(murder)?;
        if self
            .murders
            .iter()
            .any(|m| m.murderer == murder.murderer && m.victim == murder.victim)
        {
            return Err(TrackerError::DuplicateKill);
        }
        Ok(())
    }

    fn insert_murder(&mut self, murder: NewMurder) -> Murder {
        self.last_murder_id = self.last_murder_id.saturating_add(1);
        let stored = murder.into_murder(MurderId::new(self.last_murder_id));
        self.murders.push(stored.clone());
        stored
    }

    fn listing(&self, murder: &Murder) -> MurderListing {
        let location = murder.location.and_then(|id| self.location(id));
        MurderListing {
            murder: murder.clone(),
            murderer_name: self.player(murder.murderer).map(|p| p.name.clone()),
            victim_name: self.player(murder.victim).map(|p| p.name.clone()),
            location_name: location.map(|l| l.name.clone()),
            lat: location.and_then(|l| l.lat),
            lng: location.and_then(|l| l.lng),
        }
    }
}

/// Murder repository and collaborator directories held in memory.
///
/// Games and players are seeded with [`InMemoryStore::insert_game`] and
/// [`InMemoryStore::insert_player`]; locations and murders go through the
/// regular trait operations.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a game round. An existing round with the same id is
    /// replaced.
    pub async fn insert_game(&self, game: GameRound) {
        let mut tables = self.tables.write().await;
        tables.games.retain(|g| g.id != game.id);
        tables.games.push(game);
    }

    /// Registers a player.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::ConstraintViolation`] if the player's game
    /// does not exist or the id or kill code is already taken.
    pub async fn insert_player(&self, player: Player) -> Result<(), TrackerError> {
        let mut tables = self.tables.write().await;
        if !tables.games.iter().any(|g| g.id == player.game) {
            return Err(TrackerError::ConstraintViolation(format!(
                "unknown game {}",
                player.game
            )));
        }
        if tables
            .players
            .iter()
            .any(|p| p.id == player.id || p.code == player.code)
        {
            return Err(TrackerError::ConstraintViolation(format!(
                "player {} or its kill code already exists",
                player.id
            )));
        }
        tables.players.push(player);
        Ok(())
    }
}

#[async_trait]
impl MurderStore for InMemoryStore {
    async fn add(&self, murder: NewMurder) -> Result<Murder, TrackerError> {
        let mut tables = self.tables.write().await;
        tables.check_murder(&murder)?;
        Ok(tables.insert_murder(murder))
    }

    async fn add_at_new_location(
        &self,
        mut murder: NewMurder,
        location: NewLocation,
    ) -> Result<(Murder, Location), TrackerError> {
        let mut tables = self.tables.write().await;
        murder.location = None;
        tables.check_murder(&murder)?;
        let location = tables.insert_location(location);
        murder.location = Some(location.id);
        Ok((tables.insert_murder(murder), location))
    }

    async fn get(&self, id: MurderId, game: GameId) -> Result<Option<Murder>, TrackerError> {
        let tables = self.tables.read().await;
        Ok(tables
            .murders
            .iter()
            .find(|m| m.id == id && m.game == game)
            .cloned())
    }

    async fn delete(&self, murder: &Murder) -> Result<(), TrackerError> {
        let mut tables = self.tables.write().await;
        let before = tables.murders.len();
        tables.murders.retain(|m| m.id != murder.id);
        if tables.murders.len() == before {
            return Err(TrackerError::MurderNotFound(murder.id));
        }
        Ok(())
    }

    async fn list(&self, filter: &MurderFilter) -> Result<Vec<MurderListing>, TrackerError> {
        let tables = self.tables.read().await;
        Ok(tables
            .murders
            .iter()
            .filter(|m| filter.matches(m))
            .map(|m| tables.listing(m))
            .collect())
    }

    async fn count(&self, game: GameId) -> Result<i64, TrackerError> {
        let tables = self.tables.read().await;
        let count = tables.murders.iter().filter(|m| m.game == game).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn first_kill(&self, game: GameId) -> Result<Option<Murder>, TrackerError> {
        let tables = self.tables.read().await;
        Ok(tables.murders.iter().find(|m| m.game == game).cloned())
    }
}

#[async_trait]
impl PlayerDirectory for InMemoryStore {
    async fn find(&self, id: PlayerId) -> Result<Option<Player>, TrackerError> {
        Ok(self.tables.read().await.player(id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Player>, TrackerError> {
        let tables = self.tables.read().await;
        Ok(tables.players.iter().find(|p| p.code == code).cloned())
    }

    async fn is_dead(&self, id: PlayerId) -> Result<bool, TrackerError> {
        let tables = self.tables.read().await;
        Ok(tables.player(id).is_some_and(|p| tables.is_dead(p)))
    }

    async fn list(
        &self,
        game: Option<GameId>,
        death: Option<bool>,
    ) -> Result<Vec<Player>, TrackerError> {
        let tables = self.tables.read().await;
        Ok(tables
            .players
            .iter()
            .filter(|p| game.is_none_or(|g| g == p.game))
            .filter(|p| death.is_none_or(|dead| dead == tables.is_dead(p)))
            .cloned()
            .collect())
    }

    async fn count(&self, game: GameId) -> Result<i64, TrackerError> {
        let tables = self.tables.read().await;
        let count = tables.players.iter().filter(|p| p.game == game).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl LocationDirectory for InMemoryStore {
    async fn add(&self, location: NewLocation) -> Result<Location, TrackerError> {
        Ok(self.tables.write().await.insert_location(location))
    }

    async fn list(&self) -> Result<Vec<Location>, TrackerError> {
        Ok(self.tables.read().await.locations.clone())
    }
}

#[async_trait]
impl GameDirectory for InMemoryStore {
    async fn latest(&self) -> Result<Option<GameRound>, TrackerError> {
        let tables = self.tables.read().await;
        Ok(tables
            .games
            .iter()
            .max_by_key(|g| (g.year, g.number, g.id))
            .copied())
    }
}
