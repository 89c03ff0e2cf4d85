//! Kill form handlers: form data, submission, latest-game redirect.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{KillFormQuery, KillRejectedResponse, LogKillRequest, LogKillResponse};
use crate::app_state::AppState;
use crate::domain::GameId;
use crate::error::{ErrorResponse, TrackerError};
use crate::service::{KillForm, KillOutcome};

/// `GET /games/{game}/kills`: Data for the kill form.
///
/// # Errors
///
/// Returns [`TrackerError`] if players or locations cannot be listed.
#[utoipa::path(
    get,
    path = "/api/v1/games/{game}/kills",
    tag = "Kills",
    summary = "Kill form",
    description = "Returns the living players and known locations of the game, with the kill code pre-filled if given.",
    params(
        ("game" = i64, Path, description = "Game id"),
        KillFormQuery,
    ),
    responses(
        (status = 200, description = "Kill form data", body = KillForm),
    )
)]
pub async fn kill_form(
    State(state): State<AppState>,
    Path(game): Path<GameId>,
    Query(query): Query<KillFormQuery>,
) -> Result<Json<KillForm>, TrackerError> {
    let kill_code = query.kill_code.filter(|code| !code.trim().is_empty());
    let form = state.murder_service.kill_form(game, kill_code).await?;
    Ok(Json(form))
}

/// `POST /games/{game}/kills`: Log a kill.
///
/// # Errors
///
/// Returns [`TrackerError`] only on storage failures; rule violations are a
/// `422` carrying the form.
#[utoipa::path(
    post,
    path = "/api/v1/games/{game}/kills",
    tag = "Kills",
    summary = "Log a kill",
    description = "Validates the kill against the kill-form rules and stores it. A rejected kill returns the rule that failed together with the form to show again.",
    params(("game" = i64, Path, description = "Game id")),
    request_body = LogKillRequest,
    responses(
        (status = 201, description = "Kill logged", body = LogKillResponse),
        (status = 422, description = "Kill rejected", body = KillRejectedResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn log_kill(
    State(state): State<AppState>,
    Path(game): Path<GameId>,
    Json(req): Json<LogKillRequest>,
) -> Result<Response, TrackerError> {
    let outcome = state.murder_service.log_kill(game, req.into()).await?;
    let response = match outcome {
        KillOutcome::Logged(murder) => (
            StatusCode::CREATED,
            Json(LogKillResponse {
                murder,
                redirect: format!("/api/v1/games/{game}/murders"),
            }),
        )
            .into_response(),
        KillOutcome::Rejected { rejection, form } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(KillRejectedResponse { rejection, form }),
        )
            .into_response(),
    };
    Ok(response)
}

/// `GET /kill`: Redirect to the kill form of the latest game.
///
/// # Errors
///
/// Returns [`TrackerError::NoActiveGame`] if no game exists yet.
#[utoipa::path(
    get,
    path = "/api/v1/kill",
    tag = "Kills",
    summary = "Kill form of the latest game",
    responses(
        (status = 307, description = "Redirect to the latest game's kill form"),
        (status = 404, description = "No game yet", body = ErrorResponse),
    )
)]
pub async fn latest_kill_form(State(state): State<AppState>) -> Result<Redirect, TrackerError> {
    latest_redirect(&state, None).await
}

/// `GET /kill/{kill_code}`: Redirect to the latest game's kill form with
/// the code pre-filled.
///
/// # Errors
///
/// Returns [`TrackerError::NoActiveGame`] if no game exists yet.
#[utoipa::path(
    get,
    path = "/api/v1/kill/{kill_code}",
    tag = "Kills",
    summary = "Pre-filled kill form of the latest game",
    params(("kill_code" = String, Path, description = "Kill code to pre-fill")),
    responses(
        (status = 307, description = "Redirect to the latest game's kill form"),
        (status = 404, description = "No game yet", body = ErrorResponse),
    )
)]
pub async fn latest_kill_form_with_code(
    State(state): State<AppState>,
    Path(kill_code): Path<String>,
) -> Result<Redirect, TrackerError> {
    latest_redirect(&state, Some(kill_code)).await
}

async fn latest_redirect(
    state: &AppState,
    kill_code: Option<String>,
) -> Result<Redirect, TrackerError> {
    let game = state.murder_service.latest_game().await?;
    let target = match kill_code.filter(|code| is_plain_code(code)) {
        Some(code) => format!("/api/v1/games/{}/kills?kill_code={code}", game.id),
        None => format!("/api/v1/games/{}/kills", game.id),
    };
    Ok(Redirect::temporary(&target))
}

/// Kill codes are short alphanumeric tokens; anything else is dropped
/// rather than carried into the redirect target.
fn is_plain_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Kill routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/games/{game}/kills", get(kill_form).post(log_kill))
        .route("/kill", get(latest_kill_form))
        .route("/kill/{kill_code}", get(latest_kill_form_with_code))
}
