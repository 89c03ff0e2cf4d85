//! Achievement recomputation requests.
//!
//! Logging or deleting a kill changes the inputs of achievement progress.
//! The murder domain does not compute achievements itself; it publishes a
//! [`ProgressEvent`] through the [`super::EventBus`] and the achievement
//! module picks it up.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{GameId, PlayerId};

/// Request to recompute achievement progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Progress of one player must be recomputed (a kill involving them was
    /// logged).
    SelectedProgress {
        /// Game round.
        game: GameId,
        /// Player whose progress changed.
        player: PlayerId,
        /// When the request was raised.
        timestamp: DateTime<Utc>,
    },

    /// Progress of every player in the game must be recomputed (a kill was
    /// removed).
    TotalProgress {
        /// Game round.
        game: GameId,
        /// When the request was raised.
        timestamp: DateTime<Utc>,
    },
}

impl ProgressEvent {
    /// Returns the game the event refers to.
    #[must_use]
    pub const fn game(&self) -> GameId {
        match self {
            Self::SelectedProgress { game, .. } | Self::TotalProgress { game, .. } => *game,
        }
    }

    /// Returns the player for single-player requests.
    #[must_use]
    pub const fn player(&self) -> Option<PlayerId> {
        match self {
            Self::SelectedProgress { player, .. } => Some(*player),
            Self::TotalProgress { .. } => None,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::SelectedProgress { .. } => "selected_progress",
            Self::TotalProgress { .. } => "total_progress",
        }
    }
}
