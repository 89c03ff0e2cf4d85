//! Service error types with HTTP status code mapping.
//!
//! [`TrackerError`] is the central error type. Each variant maps to a
//! numeric code and an HTTP status, and renders as a structured JSON body.
//! Kill validation failures are not errors; see
//! [`crate::service::KillRejection`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{MurderId, PlayerId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2010,
///     "message": "murder already logged for this murderer and victim",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No murder with the given id exists in the requested game.
    #[error("murder not found: {0}")]
    MurderNotFound(MurderId),

    /// A player referenced by a murder could not be resolved.
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// No game round has been created yet.
    #[error("no active game")]
    NoActiveGame,

    /// The `(murderer, victim)` pair is already logged.
    #[error("murder already logged for this murderer and victim")]
    DuplicateKill,

    /// A referenced game, player or location does not exist.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TrackerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::MurderNotFound(_) => 2001,
            Self::PlayerNotFound(_) => 2002,
            Self::NoActiveGame => 2003,
            Self::ConstraintViolation(_) => 2009,
            Self::DuplicateKill => 2010,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::MurderNotFound(_) | Self::PlayerNotFound(_) | Self::NoActiveGame => {
                StatusCode::NOT_FOUND
            }
            Self::ConstraintViolation(_) | Self::DuplicateKill => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
