//! Murder listing query parameters.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{GameId, MurderFilter, PlayerId};

/// Filters for `GET /murders`.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MurderListQuery {
    /// Only murders of this game.
    #[param(value_type = Option<i64>)]
    pub game: Option<GameId>,
    /// Only murders committed by this player.
    #[param(value_type = Option<i64>)]
    pub murderer: Option<PlayerId>,
}

impl From<MurderListQuery> for MurderFilter {
    fn from(query: MurderListQuery) -> Self {
        Self {
            game: query.game,
            murderer: query.murderer,
        }
    }
}

/// Filters for `GET /games/{game}/murders`.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GameMurderQuery {
    /// Only murders committed by this player.
    #[param(value_type = Option<i64>)]
    pub murderer: Option<PlayerId>,
}

impl GameMurderQuery {
    /// Filter for the murders of `game` narrowed by this query.
    #[must_use]
    pub fn filter(self, game: GameId) -> MurderFilter {
        MurderFilter {
            game: Some(game),
            murderer: self.murderer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_becomes_filter() {
        let query: MurderListQuery =
            serde_json::from_str(r#"{"murderer": 4}"#).unwrap_or_default();
        let filter = MurderFilter::from(query);
        assert_eq!(filter.game, None);
        assert_eq!(filter.murderer, Some(PlayerId::new(4)));

        let scoped = GameMurderQuery::default().filter(GameId::new(2));
        assert_eq!(scoped, MurderFilter::game(GameId::new(2)));
    }
}
