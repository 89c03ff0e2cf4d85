//! The murder record and its query-side shapes.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{GameId, LocationId, MurderId, PlayerId};

/// Accepted textual forms of a kill timestamp, tried in order.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// A logged kill.
///
/// Kills are immutable facts: once stored a record is only ever deleted,
/// never updated. At most one record exists per `(murderer, victim)` pair
/// across all games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Murder {
    /// Repository-assigned identifier.
    pub id: MurderId,
    /// Game round the kill belongs to.
    pub game: GameId,
    /// Player who made the kill.
    pub murderer: PlayerId,
    /// Player who was killed.
    pub victim: PlayerId,
    /// When the kill happened.
    pub datetime: NaiveDateTime,
    /// Where the kill happened, if a location was recorded.
    pub location: Option<LocationId>,
}

/// A murder that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMurder {
    /// Owning game round.
    pub game: GameId,
    /// Killer.
    pub murderer: PlayerId,
    /// Victim.
    pub victim: PlayerId,
    /// Time of the kill.
    pub datetime: NaiveDateTime,
    /// Optional kill location.
    pub location: Option<LocationId>,
}

impl NewMurder {
    /// Attaches a freshly assigned id, producing the stored record.
    #[must_use]
    pub fn into_murder(self, id: MurderId) -> Murder {
        Murder {
            id,
            game: self.game,
            murderer: self.murderer,
            victim: self.victim,
            datetime: self.datetime,
            location: self.location,
        }
    }
}

/// One row of a murder listing: the record plus display fields joined in
/// from the player and location tables.
///
/// Join targets that do not exist leave their fields `None`; the row is
/// never dropped. Every field here is part of the JSON listing contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MurderListing {
    /// The stored record.
    #[serde(flatten)]
    pub murder: Murder,
    /// Name of the murderer.
    pub murderer_name: Option<String>,
    /// Name of the victim.
    pub victim_name: Option<String>,
    /// Name of the kill location.
    pub location_name: Option<String>,
    /// Latitude of the kill location.
    pub lat: Option<f64>,
    /// Longitude of the kill location.
    pub lng: Option<f64>,
}

/// Optional filters for murder listings.
///
/// Every present filter narrows the result; absent filters match all rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MurderFilter {
    /// Only murders of this game.
    pub game: Option<GameId>,
    /// Only murders committed by this player.
    pub murderer: Option<PlayerId>,
}

impl MurderFilter {
    /// Filter matching every murder of `game`.
    #[must_use]
    pub const fn game(game: GameId) -> Self {
        Self {
            game: Some(game),
            murderer: None,
        }
    }

    /// Narrows the filter to one murderer.
    #[must_use]
    pub const fn with_murderer(mut self, murderer: PlayerId) -> Self {
        self.murderer = Some(murderer);
        self
    }

    /// Returns `(column, value)` pairs for each present filter, in a fixed
    /// order. SQL backends turn each pair into one `column = $n` clause.
    #[must_use]
    pub fn conditions(&self) -> Vec<(&'static str, i64)> {
        [
            ("murder.game", self.game.map(GameId::get)),
            ("murder.murderer", self.murderer.map(PlayerId::get)),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
        .collect()
    }

    /// Returns `true` if `murder` satisfies every present filter.
    #[must_use]
    pub fn matches(&self, murder: &Murder) -> bool {
        self.game.is_none_or(|g| g == murder.game)
            && self.murderer.is_none_or(|m| m == murder.murderer)
    }
}

/// Parses a submitted kill timestamp.
///
/// Accepts `YYYY-MM-DD` (midnight), and `YYYY-MM-DD HH:MM[:SS]` with either
/// a space or a `T` separator. Returns `None` for anything else.
#[must_use]
pub fn parse_kill_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
