//! Murder handlers: listing, lookup, admin entry, deletion, first kill.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{GameMurderQuery, MurderListQuery};
use crate::app_state::AppState;
use crate::domain::{GameId, Murder, MurderFilter, MurderId, MurderListing};
use crate::error::{ErrorResponse, TrackerError};
use crate::service::AdminMurderSubmission;

/// `GET /murders`: List murders across games.
///
/// # Errors
///
/// Returns [`TrackerError`] if the repository fails.
#[utoipa::path(
    get,
    path = "/api/v1/murders",
    tag = "Murders",
    summary = "List murders",
    description = "Returns every murder matching the optional game and murderer filters, with player names, location name and coordinates joined in.",
    params(MurderListQuery),
    responses(
        (status = 200, description = "Murder listing", body = Vec<MurderListing>),
    )
)]
pub async fn list_murders(
    State(state): State<AppState>,
    Query(query): Query<MurderListQuery>,
) -> Result<Json<Vec<MurderListing>>, TrackerError> {
    let filter = MurderFilter::from(query);
    let murders = state.murder_service.list_murders(&filter).await?;
    Ok(Json(murders))
}

/// `GET /games/{game}/murders`: List the murders of one game.
///
/// # Errors
///
/// Returns [`TrackerError`] if the repository fails.
#[utoipa::path(
    get,
    path = "/api/v1/games/{game}/murders",
    tag = "Murders",
    summary = "List game murders",
    description = "Returns the murders of one game, optionally narrowed to one murderer. Serves both the murder list and the murder map.",
    params(
        ("game" = i64, Path, description = "Game id"),
        GameMurderQuery,
    ),
    responses(
        (status = 200, description = "Murder listing", body = Vec<MurderListing>),
    )
)]
pub async fn list_game_murders(
    State(state): State<AppState>,
    Path(game): Path<GameId>,
    Query(query): Query<GameMurderQuery>,
) -> Result<Json<Vec<MurderListing>>, TrackerError> {
    let murders = state.murder_service.list_murders(&query.filter(game)).await?;
    Ok(Json(murders))
}

/// `POST /games/{game}/murders`: Enter a murder as administrator.
///
/// # Errors
///
/// Returns [`TrackerError`] on an unparsable time or a constraint
/// violation.
#[utoipa::path(
    post,
    path = "/api/v1/games/{game}/murders",
    tag = "Murders",
    summary = "Enter a murder",
    description = "Stores a murder without the kill-form rules. A named free-text location is created and used.",
    params(("game" = i64, Path, description = "Game id")),
    request_body = AdminMurderSubmission,
    responses(
        (status = 201, description = "Murder stored", body = Murder),
        (status = 400, description = "Unparsable time", body = ErrorResponse),
        (status = 409, description = "Pair already logged or dangling reference", body = ErrorResponse),
    )
)]
pub async fn create_murder(
    State(state): State<AppState>,
    Path(game): Path<GameId>,
    Json(req): Json<AdminMurderSubmission>,
) -> Result<impl IntoResponse, TrackerError> {
    let murder = state.murder_service.submit_murder(game, req).await?;
    Ok((StatusCode::CREATED, Json(murder)))
}

/// `GET /games/{game}/murders/{id}`: Fetch one murder.
///
/// # Errors
///
/// Returns [`TrackerError::MurderNotFound`] if it does not exist in the game.
#[utoipa::path(
    get,
    path = "/api/v1/games/{game}/murders/{id}",
    tag = "Murders",
    summary = "Get a murder",
    params(
        ("game" = i64, Path, description = "Game id"),
        ("id" = i64, Path, description = "Murder id"),
    ),
    responses(
        (status = 200, description = "The murder", body = Murder),
        (status = 404, description = "Murder not found", body = ErrorResponse),
    )
)]
pub async fn get_murder(
    State(state): State<AppState>,
    Path((game, id)): Path<(GameId, MurderId)>,
) -> Result<Json<Murder>, TrackerError> {
    let murder = state.murder_service.get_murder(game, id).await?;
    Ok(Json(murder))
}

/// `DELETE /games/{game}/murders/{id}`: Delete a murder.
///
/// # Errors
///
/// Returns [`TrackerError::MurderNotFound`] if it does not exist in the game.
#[utoipa::path(
    delete,
    path = "/api/v1/games/{game}/murders/{id}",
    tag = "Murders",
    summary = "Delete a murder",
    description = "Deletes the murder and requests achievement recomputation for the whole game.",
    params(
        ("game" = i64, Path, description = "Game id"),
        ("id" = i64, Path, description = "Murder id"),
    ),
    responses(
        (status = 200, description = "The deleted murder", body = Murder),
        (status = 404, description = "Murder not found", body = ErrorResponse),
    )
)]
pub async fn delete_murder(
    State(state): State<AppState>,
    Path((game, id)): Path<(GameId, MurderId)>,
) -> Result<Json<Murder>, TrackerError> {
    let murder = state.murder_service.delete_murder(game, id).await?;
    Ok(Json(murder))
}

/// `GET /games/{game}/first-kill`: First murder logged in a game.
///
/// # Errors
///
/// Returns [`TrackerError`] if the repository fails.
#[utoipa::path(
    get,
    path = "/api/v1/games/{game}/first-kill",
    tag = "Murders",
    summary = "First kill",
    description = "Returns the earliest inserted murder of the game, or null before the first kill.",
    params(("game" = i64, Path, description = "Game id")),
    responses(
        (status = 200, description = "The first murder, or null", body = Option<Murder>),
    )
)]
pub async fn first_kill(
    State(state): State<AppState>,
    Path(game): Path<GameId>,
) -> Result<Json<Option<Murder>>, TrackerError> {
    let murder = state.murder_service.first_kill(game).await?;
    Ok(Json(murder))
}

/// Murder routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/murders", get(list_murders))
        .route(
            "/games/{game}/murders",
            get(list_game_murders).post(create_murder),
        )
        .route(
            "/games/{game}/murders/{id}",
            get(get_murder).delete(delete_murder),
        )
        .route("/games/{game}/first-kill", get(first_kill))
}
