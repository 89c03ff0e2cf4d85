//! Statistics handlers.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::GameId;
use crate::error::{ErrorResponse, TrackerError};
use crate::service::StatsPage;

/// `GET /games/{game}/stats`: Statistics page of a game.
///
/// # Errors
///
/// Returns [`TrackerError::PlayerNotFound`] if the most wanted murderer
/// cannot be resolved.
#[utoipa::path(
    get,
    path = "/api/v1/games/{game}/stats",
    tag = "Stats",
    summary = "Game statistics",
    description = "Returns every player and murder of the game together with the most wanted player. Ties on kill count go to the lowest player id.",
    params(("game" = i64, Path, description = "Game id")),
    responses(
        (status = 200, description = "Statistics page", body = StatsPage),
        (status = 404, description = "Most wanted player missing", body = ErrorResponse),
    )
)]
pub async fn stats_page(
    State(state): State<AppState>,
    Path(game): Path<GameId>,
) -> Result<Json<StatsPage>, TrackerError> {
    let page = state.murder_service.stats_page(game).await?;
    Ok(Json(page))
}

/// `GET /stats/simple`: Alive and murder counts of the latest game.
///
/// # Errors
///
/// Returns [`TrackerError::NoActiveGame`] if no game exists yet.
#[utoipa::path(
    get,
    path = "/api/v1/stats/simple",
    tag = "Stats",
    summary = "Simple statistics",
    description = "Plain text: the number of living players on the first line, the number of murders on the second. Assumes every murder removed a distinct victim.",
    responses(
        (status = 200, description = "Alive and murder counts", body = String, content_type = "text/plain"),
        (status = 404, description = "No game yet", body = ErrorResponse),
    )
)]
pub async fn simple_stats(State(state): State<AppState>) -> Result<impl IntoResponse, TrackerError> {
    let stats = state.murder_service.latest_simple_stats().await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("{}\n{}\n", stats.alive, stats.murders),
    ))
}

/// Statistics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/games/{game}/stats", get(stats_page))
        .route("/stats/simple", get(simple_stats))
}
