//! Aggregates over murder listings: the most wanted player and population
//! counts.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use super::MurderService;
use crate::domain::{GameId, Murder, MurderFilter, MurderListing, Player, PlayerId};
use crate::error::TrackerError;

/// Returns the murderer with the most kills and their kill count.
///
/// Ties go to the lowest player id. Returns `None` for an empty input.
pub fn most_wanted<'a, I>(murders: I) -> Option<(PlayerId, usize)>
where
    I: IntoIterator<Item = &'a Murder>,
{
    let mut counts: HashMap<PlayerId, usize> = HashMap::new();
    for murder in murders {
        let count = counts.entry(murder.murderer).or_default();
        *count = count.saturating_add(1);
    }
    counts
        .into_iter()
        .max_by(|(a_id, a_count), (b_id, b_count)| {
            a_count.cmp(b_count).then_with(|| b_id.cmp(a_id))
        })
}

/// The player with the most kills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MostWanted {
    /// The player.
    pub player: Player,
    /// Number of murders they committed. Computed, never stored.
    pub murders: usize,
}

/// Alive and dead population of a game.
///
/// `alive` assumes every murder removed a distinct victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct SimpleStats {
    /// Registered players minus murders.
    pub alive: i64,
    /// Murders logged.
    pub murders: i64,
}

/// Everything shown on a game's statistics page.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatsPage {
    /// Game the page describes.
    pub game: GameId,
    /// Every player of the game, dead or alive.
    pub players: Vec<Player>,
    /// Every murder of the game with names joined in.
    pub murders: Vec<MurderListing>,
    /// Leading murderer, absent while nobody has killed yet.
    pub most_wanted: Option<MostWanted>,
}

impl MurderService {
    /// Resolves the most wanted player of `game`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::PlayerNotFound`] if the leading murderer no
    /// longer resolves to a player.
    pub async fn most_wanted(&self, game: GameId) -> Result<Option<MostWanted>, TrackerError> {
        let murders = self.store.list(&MurderFilter::game(game)).await?;
        self.resolve_most_wanted(&murders).await
    }

    /// Counts living players and murders of `game`.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if a count fails.
    pub async fn simple_stats(&self, game: GameId) -> Result<SimpleStats, TrackerError> {
        let players = self.players.count(game).await?;
        let murders = self.store.count(game).await?;
        Ok(SimpleStats {
            alive: players.saturating_sub(murders),
            murders,
        })
    }

    /// [`MurderService::simple_stats`] of the most recent game.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NoActiveGame`] if no round exists yet.
    pub async fn latest_simple_stats(&self) -> Result<SimpleStats, TrackerError> {
        let game = self.latest_game().await?;
        self.simple_stats(game.id).await
    }

    /// Collects the statistics page of `game`.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackerError`] if a lookup fails.
    pub async fn stats_page(&self, game: GameId) -> Result<StatsPage, TrackerError> {
        let players = self.players.list(Some(game), None).await?;
        let murders = self.store.list(&MurderFilter::game(game)).await?;
        let most_wanted = self.resolve_most_wanted(&murders).await?;
        Ok(StatsPage {
            game,
            players,
            murders,
            most_wanted,
        })
    }

    async fn resolve_most_wanted(
        &self,
        murders: &[MurderListing],
    ) -> Result<Option<MostWanted>, TrackerError> {
        let Some((id, count)) = most_wanted(murders.iter().map(|row| &row.murder)) else {
            return Ok(None);
        };
        let player = self
            .players
            .find(id)
            .await?
            .ok_or(TrackerError::PlayerNotFound(id))?;
        Ok(Some(MostWanted {
            player,
            murders: count,
        }))
    }
}
