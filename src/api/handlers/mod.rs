//! REST endpoint handlers organized by resource.

pub mod kill;
pub mod murder;
pub mod stats;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(murder::routes())
        .merge(kill::routes())
        .merge(stats::routes())
}
