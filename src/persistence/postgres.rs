//! PostgreSQL implementation of the persistence layer.
//!
//! Queries are built at runtime (no compile-time checked macros), so the
//! crate builds without a live database. The `murder` table is owned here;
//! `player`, `location` and `game` belong to their own modules and are only
//! read, apart from inserting free-text locations.
//!
//! ## Error Mapping
//!
//! | SQLSTATE | Meaning               | [`TrackerError`]        |
//! |----------|-----------------------|-------------------------|
//! | `23505`  | unique violation      | `DuplicateKill`         |
//! | `23503`  | foreign key violation | `ConstraintViolation`   |
//! | other    | anything else         | `PersistenceError`      |

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::MurderStore;
use crate::domain::{
    GameDirectory, GameId, GameRound, Location, LocationDirectory, LocationId, Murder,
    MurderFilter, MurderId, MurderListing, NewLocation, NewMurder, Player, PlayerDirectory,
    PlayerId,
};
use crate::error::TrackerError;

/// Schema of the murder table.
const CREATE_MURDER_TABLE: &str = "CREATE TABLE IF NOT EXISTS murder (
    id BIGSERIAL PRIMARY KEY,
    game BIGINT NOT NULL REFERENCES game (id),
    murderer BIGINT NOT NULL REFERENCES player (id),
    victim BIGINT NOT NULL REFERENCES player (id),
    datetime TIMESTAMP NOT NULL,
    location BIGINT REFERENCES location (id),
    UNIQUE (murderer, victim)
)";

const INSERT_MURDER: &str = "INSERT INTO murder (game, murderer, victim, datetime, location) \
     VALUES ($1, $2, $3, $4, $5) RETURNING id";

const INSERT_LOCATION: &str = "INSERT INTO location (name, lat, lng) VALUES ($1, $2, $3) RETURNING id";

const MURDER_COLUMNS: &str = "id, game, murderer, victim, datetime, location";

const LISTING_SELECT: &str = "SELECT murder.id, murder.game, murder.murderer, murder.victim, \
     murder.datetime, murder.location, \
     murderer.name, victim.name, location.name, location.lat, location.lng \
     FROM murder \
     LEFT JOIN player AS murderer ON murderer.id = murder.murderer \
     LEFT JOIN player AS victim ON victim.id = murder.victim \
     LEFT JOIN location ON location.id = murder.location";

const PLAYER_SELECT: &str = "SELECT player.id, player.game, player.name, player.code, player.disabled \
     FROM player";

const DEATH_EXPR: &str = "(player.disabled OR EXISTS \
     (SELECT 1 FROM murder WHERE murder.victim = player.id))";

type MurderRow = (i64, i64, i64, i64, NaiveDateTime, Option<i64>);

type ListingRow = (
    i64,
    i64,
    i64,
    i64,
    NaiveDateTime,
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<f64>,
    Option<f64>,
);

type PlayerRow = (i64, i64, String, String, bool);

type LocationRow = (i64, String, Option<f64>, Option<f64>);

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct PostgresSettings {
    /// PostgreSQL connection string.
    pub url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Minimum idle connections.
    pub min_connections: u32,
    /// Timeout for acquiring a connection.
    pub acquire_timeout: Duration,
}

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool with the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::PersistenceError`] if the database cannot be
    /// reached.
    pub async fn connect(settings: &PostgresSettings) -> Result<Self, TrackerError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(&settings.url)
            .await
            .map_err(|e| TrackerError::PersistenceError(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Creates the murder table if it does not exist. The referenced
    /// `game`, `player` and `location` tables must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::PersistenceError`] on database failure.
    pub async fn init_schema(&self) -> Result<(), TrackerError> {
        sqlx::query(CREATE_MURDER_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("init_schema", e))?;
        tracing::info!("murder table ready");
        Ok(())
    }
}

#[async_trait]
impl MurderStore for PostgresStore {
    async fn add(&self, murder: NewMurder) -> Result<Murder, TrackerError> {
        let id = sqlx::query_scalar::<_, i64>(INSERT_MURDER)
            .bind(murder.game.get())
            .bind(murder.murderer.get())
            .bind(murder.victim.get())
            .bind(murder.datetime)
            .bind(murder.location.map(LocationId::get))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("add", e))?;

        Ok(murder.into_murder(MurderId::new(id)))
    }

    async fn add_at_new_location(
        &self,
        mut murder: NewMurder,
        location: NewLocation,
    ) -> Result<(Murder, Location), TrackerError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("add_at_new_location", e))?;

        let location_id = sqlx::query_scalar::<_, i64>(INSERT_LOCATION)
            .bind(&location.name)
            .bind(location.lat)
            .bind(location.lng)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("add_location", e))?;
        murder.location = Some(LocationId::new(location_id));

        // Dropping `tx` on error rolls the location back.
        let id = sqlx::query_scalar::<_, i64>(INSERT_MURDER)
            .bind(murder.game.get())
            .bind(murder.murderer.get())
            .bind(murder.victim.get())
            .bind(murder.datetime)
            .bind(murder.location.map(LocationId::get))
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("add", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("add_at_new_location", e))?;

        Ok((
            murder.into_murder(MurderId::new(id)),
            Location {
                id: LocationId::new(location_id),
                name: location.name,
                lat: location.lat,
                lng: location.lng,
            },
        ))
    }

    async fn get(&self, id: MurderId, game: GameId) -> Result<Option<Murder>, TrackerError> {
        let row = sqlx::query_as::<_, MurderRow>(&format!(
            "SELECT {MURDER_COLUMNS} FROM murder WHERE id = $1 AND game = $2"
        ))
        .bind(id.get())
        .bind(game.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get", e))?;

        Ok(row.map(murder_from_row))
    }

    async fn delete(&self, murder: &Murder) -> Result<(), TrackerError> {
        let result = sqlx::query("DELETE FROM murder WHERE id = $1")
            .bind(murder.id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(TrackerError::MurderNotFound(murder.id));
        }
        Ok(())
    }

    async fn list(&self, filter: &MurderFilter) -> Result<Vec<MurderListing>, TrackerError> {
        let rows = listing_query(filter)
            .build_query_as::<ListingRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, game, murderer, victim, datetime, location, m_name, v_name, l_name, lat, lng)| {
                    MurderListing {
                        murder: murder_from_row((id, game, murderer, victim, datetime, location)),
                        murderer_name: m_name,
                        victim_name: v_name,
                        location_name: l_name,
                        lat,
                        lng,
                    }
                },
            )
            .collect())
    }

    async fn count(&self, game: GameId) -> Result<i64, TrackerError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM murder WHERE game = $1")
            .bind(game.get())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))
    }

    async fn first_kill(&self, game: GameId) -> Result<Option<Murder>, TrackerError> {
        let row = sqlx::query_as::<_, MurderRow>(&format!(
            "SELECT {MURDER_COLUMNS} FROM murder WHERE game = $1 ORDER BY id LIMIT 1"
        ))
        .bind(game.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("first_kill", e))?;

        Ok(row.map(murder_from_row))
    }
}

#[async_trait]
impl PlayerDirectory for PostgresStore {
    async fn find(&self, id: PlayerId) -> Result<Option<Player>, TrackerError> {
        let row = sqlx::query_as::<_, PlayerRow>(&format!("{PLAYER_SELECT} WHERE player.id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_player", e))?;
        Ok(row.map(player_from_row))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Player>, TrackerError> {
        let row =
            sqlx::query_as::<_, PlayerRow>(&format!("{PLAYER_SELECT} WHERE player.code = $1"))
                .bind(code)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("find_player_by_code", e))?;
        Ok(row.map(player_from_row))
    }

    async fn is_dead(&self, id: PlayerId) -> Result<bool, TrackerError> {
        let dead = sqlx::query_scalar::<_, bool>(&format!(
            "SELECT {DEATH_EXPR} FROM player WHERE player.id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("is_dead", e))?;
        Ok(dead.unwrap_or(false))
    }

    async fn list(
        &self,
        game: Option<GameId>,
        death: Option<bool>,
    ) -> Result<Vec<Player>, TrackerError> {
        let mut query = QueryBuilder::<Postgres>::new(PLAYER_SELECT);
        query.push(" WHERE TRUE");
        if let Some(game) = game {
            query.push(" AND player.game = ");
            query.push_bind(game.get());
        }
        if let Some(death) = death {
            query.push(" AND ");
            query.push(DEATH_EXPR);
            query.push(" = ");
            query.push_bind(death);
        }
        query.push(" ORDER BY player.id");

        let rows = query
            .build_query_as::<PlayerRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_players", e))?;
        Ok(rows.into_iter().map(player_from_row).collect())
    }

    async fn count(&self, game: GameId) -> Result<i64, TrackerError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM player WHERE game = $1")
            .bind(game.get())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_players", e))
    }
}

#[async_trait]
impl LocationDirectory for PostgresStore {
    async fn add(&self, location: NewLocation) -> Result<Location, TrackerError> {
        let id = sqlx::query_scalar::<_, i64>(INSERT_LOCATION)
            .bind(&location.name)
            .bind(location.lat)
            .bind(location.lng)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("add_location", e))?;

        Ok(Location {
            id: LocationId::new(id),
            name: location.name,
            lat: location.lat,
            lng: location.lng,
        })
    }

    async fn list(&self) -> Result<Vec<Location>, TrackerError> {
        let rows = sqlx::query_as::<_, LocationRow>(
            "SELECT id, name, lat, lng FROM location ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_locations", e))?;

        Ok(rows
            .into_iter()
            .map(|(id, name, lat, lng)| Location {
                id: LocationId::new(id),
                name,
                lat,
                lng,
            })
            .collect())
    }
}

#[async_trait]
impl GameDirectory for PostgresStore {
    async fn latest(&self) -> Result<Option<GameRound>, TrackerError> {
        let row = sqlx::query_as::<_, (i64, i32, i32)>(
            "SELECT id, year, number FROM game ORDER BY year DESC, number DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("latest_game", e))?;

        Ok(row.map(|(id, year, number)| GameRound {
            id: GameId::new(id),
            year,
            number,
        }))
    }
}

/// Listing query with one bound `column = $n` condition per present filter.
fn listing_query(filter: &MurderFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::<Postgres>::new(LISTING_SELECT);
    for (i, (column, value)) in filter.conditions().into_iter().enumerate() {
        query.push(if i == 0 { " WHERE " } else { " AND " });
        query.push(column);
        query.push(" = ");
        query.push_bind(value);
    }
    query.push(" ORDER BY murder.id");
    query
}

fn murder_from_row(
    (id, game, murderer, victim, datetime, location): MurderRow,
) -> Murder {
    Murder {
        id: MurderId::new(id),
        game: GameId::new(game),
        murderer: PlayerId::new(murderer),
        victim: PlayerId::new(victim),
        datetime,
        location: location.map(LocationId::new),
    }
}

fn player_from_row((id, game, name, code, disabled): PlayerRow) -> Player {
    Player {
        id: PlayerId::new(id),
        game: GameId::new(game),
        name,
        code,
        disabled,
    }
}

/// Maps a sqlx error to a [`TrackerError`], recognising constraint
/// violations by SQLSTATE.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> TrackerError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23505") => return TrackerError::DuplicateKill,
            Some("23503") => {
                return TrackerError::ConstraintViolation(format!(
                    "unknown game, player or location: {}",
                    db_err.message()
                ));
            }
            _ => {}
        }
    }
    tracing::warn!(operation, error = %err, "database operation failed");
    TrackerError::PersistenceError(format!("{operation}: {err}"))
}
