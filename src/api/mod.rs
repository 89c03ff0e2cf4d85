//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints except `/health` are mounted under `/api/v1`. With the
//! `swagger-ui` feature the generated OpenAPI document is served at
//! `/api-docs/openapi.json` and browsable at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "murder-tracker", description = "Kill logging and statistics for a live murder game."),
    paths(
        handlers::murder::list_murders,
        handlers::murder::list_game_murders,
        handlers::murder::create_murder,
        handlers::murder::get_murder,
        handlers::murder::delete_murder,
        handlers::murder::first_kill,
        handlers::kill::kill_form,
        handlers::kill::log_kill,
        handlers::kill::latest_kill_form,
        handlers::kill::latest_kill_form_with_code,
        handlers::stats::stats_page,
        handlers::stats::simple_stats,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Murders", description = "Murder records"),
        (name = "Kills", description = "Self-reported kills"),
        (name = "Stats", description = "Aggregates"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
