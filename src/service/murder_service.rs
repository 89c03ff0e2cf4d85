//! Murder service: queries, administrative entry and deletion.

use std::sync::Arc;

use serde::Deserialize;
use utoipa::ToSchema;

use super::KillWindow;
use crate::domain::{
    AchievementNotifier, GameDirectory, GameId, GameRound, LocationDirectory, LocationId, Murder,
    MurderFilter, MurderId, MurderListing, NewLocation, NewMurder, PlayerDirectory, PlayerId,
    parse_kill_datetime,
};
use crate::error::TrackerError;
use crate::persistence::MurderStore;

/// A murder entered directly by an administrator.
///
/// Nothing here is validated beyond parsing the time: the fields are
/// trusted as given.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct AdminMurderSubmission {
    /// Player who made the kill.
    pub murderer: PlayerId,
    /// Player who was killed.
    pub victim: PlayerId,
    /// Time of the kill, e.g. `2017-01-05T14:30`.
    pub datetime: String,
    /// Known location of the kill.
    #[serde(default)]
    pub location: Option<LocationId>,
    /// Free-text location; created and used when it has a name.
    #[serde(default)]
    pub new_location: Option<NewLocation>,
}

/// Orchestration layer for the murder domain.
///
/// Owns the repository and the collaborator lookups it needs. Every write
/// ends with an achievement recomputation request through the injected
/// [`AchievementNotifier`].
#[derive(Debug, Clone)]
pub struct MurderService {
    pub(super) store: Arc<dyn MurderStore>,
    pub(super) players: Arc<dyn PlayerDirectory>,
    pub(super) locations: Arc<dyn LocationDirectory>,
    pub(super) games: Arc<dyn GameDirectory>,
    pub(super) notifier: Arc<dyn AchievementNotifier>,
    pub(super) kill_window: KillWindow,
}

impl MurderService {
    /// Creates a new `MurderService` from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn MurderStore>,
        players: Arc<dyn PlayerDirectory>,
        locations: Arc<dyn LocationDirectory>,
        games: Arc<dyn GameDirectory>,
        notifier: Arc<dyn AchievementNotifier>,
        kill_window: KillWindow,
    ) -> Self {
        Self {
            store,
            players,
            locations,
            games,
            notifier,
            kill_window,
        }
    }

    /// Creates a `MurderService` whose repository and lookups are all served
    /// by one backend.
    #[must_use]
    pub fn from_backend<B>(
        backend: Arc<B>,
        notifier: Arc<dyn AchievementNotifier>,
        kill_window: KillWindow,
    ) -> Self
    where
        B: MurderStore + PlayerDirectory + LocationDirectory + GameDirectory + 'static,
    {
        Self::new(
            Arc::clone(&backend) as Arc<dyn MurderStore>,
            Arc::clone(&backend) as Arc<dyn PlayerDirectory>,
            Arc::clone(&backend) as Arc<dyn LocationDirectory>,
            backend as Arc<dyn GameDirectory>,
            notifier,
            kill_window,
        )
    }

    /// Returns the configured kill window.
    #[must_use]
    pub const fn kill_window(&self) -> KillWindow {
        self.kill_window
    }

    /// Fetches one murder of `game`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MurderNotFound`] if no such murder exists in
    /// the game.
    pub async fn get_murder(&self, game: GameId, id: MurderId) -> Result<Murder, TrackerError> {
        self.store
            .get(id, game)
            .await?
            .ok_or(TrackerError::MurderNotFound(id))
    }

    /// Lists murders matching `filter` with names and coordinates joined in.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if the repository fails.
    pub async fn list_murders(
        &self,
        filter: &MurderFilter,
    ) -> Result<Vec<MurderListing>, TrackerError> {
        self.store.list(filter).await
    }

    /// Counts the murders of `game`.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if the repository fails.
    pub async fn count_murders(&self, game: GameId) -> Result<i64, TrackerError> {
        self.store.count(game).await
    }

    /// Returns the first murder logged in `game`, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if the repository fails.
    pub async fn first_kill(&self, game: GameId) -> Result<Option<Murder>, TrackerError> {
        self.store.first_kill(game).await
    }

    /// Returns the most recent game round.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NoActiveGame`] if no round exists yet.
    pub async fn latest_game(&self) -> Result<GameRound, TrackerError> {
        self.games.latest().await?.ok_or(TrackerError::NoActiveGame)
    }

    /// Stores a murder entered by an administrator.
    ///
    /// A named free-text location is created first and replaces any selected
    /// location. Both players' achievement progress is recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidRequest`] if the time cannot be parsed
    /// [`TrackerError::DuplicateKill`] if the pair was already logged and
    /// [`TrackerError::ConstraintViolation`] if a reference is dangling.
    /// A named location is only kept when the murder is stored.
    pub async fn submit_murder(
        &self,
        game: GameId,
        submission: AdminMurderSubmission,
    ) -> Result<Murder, TrackerError> {
        let datetime = parse_kill_datetime(&submission.datetime).ok_or_else(|| {
            TrackerError::InvalidRequest(format!("unparsable datetime: {}", submission.datetime))
        })?;

        let new_murder = NewMurder {
            game,
            murderer: submission.murderer,
            victim: submission.victim,
            datetime,
            location: submission.location,
        };
        let murder = match submission.new_location.and_then(NewLocation::named) {
            Some(named) => {
                let (murder, created) = self.store.add_at_new_location(new_murder, named).await?;
                tracing::debug!(location = %created.id, name = %created.name, "location created");
                murder
            }
            None => self.store.add(new_murder).await?,
        };

        self.notifier.selected_progress(game, murder.murderer);
        self.notifier.selected_progress(game, murder.victim);

        tracing::info!(
            %game,
            murder = %murder.id,
            murderer = %murder.murderer,
            victim = %murder.victim,
            "murder entered by admin"
        );
        Ok(murder)
    }

    /// Deletes one murder of `game` and asks for every player's progress to
    /// be recomputed. Returns the deleted record.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MurderNotFound`] if the murder does not exist
    /// in the game.
    pub async fn delete_murder(&self, game: GameId, id: MurderId) -> Result<Murder, TrackerError> {
        let murder = self.get_murder(game, id).await?;
        self.store.delete(&murder).await?;
        self.notifier.total_progress(game);

        tracing::info!(%game, murder = %id, "murder deleted");
        Ok(murder)
    }
}
