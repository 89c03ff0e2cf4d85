//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::MurderService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Murder service for all business logic.
    pub murder_service: Arc<MurderService>,
}

impl AppState {
    /// Wraps a service into handler state.
    #[must_use]
    pub fn new(murder_service: MurderService) -> Self {
        Self {
            murder_service: Arc::new(murder_service),
        }
    }
}
