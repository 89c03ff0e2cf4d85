//! Kill form request and response shapes.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{LocationId, Murder, NewLocation, PlayerId};
use crate::service::{KillForm, KillRejection, KillSubmission};

/// Query of `GET /games/{game}/kills`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct KillFormQuery {
    /// Kill code to pre-fill.
    pub kill_code: Option<String>,
}

/// Body of `POST /games/{game}/kills`, mirroring the kill form fields.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LogKillRequest {
    /// Player logging the kill.
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub murderer: Option<PlayerId>,
    /// Kill code of the victim.
    #[serde(default)]
    pub kill_code: String,
    /// Time of the kill, e.g. `2017-01-05T14:30`.
    #[serde(default)]
    pub datetime: String,
    /// Id of a known location, or `"other"` to use the free-text fields.
    #[serde(default)]
    pub location: Option<String>,
    /// Free-text location name.
    #[serde(default)]
    pub location_name: Option<String>,
    /// Latitude of the free-text location.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude of the free-text location.
    #[serde(default)]
    pub lng: Option<f64>,
}

impl From<LogKillRequest> for KillSubmission {
    fn from(req: LogKillRequest) -> Self {
        let location = req
            .location
            .as_deref()
            .and_then(|raw| raw.parse::<LocationId>().ok());
        let new_location = req.location_name.map(|name| NewLocation {
            name,
            lat: req.lat,
            lng: req.lng,
        });
        Self {
            murderer: req.murderer,
            kill_code: req.kill_code.trim().to_string(),
            datetime: req.datetime,
            location,
            new_location,
        }
    }
}

/// Response of an accepted kill.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LogKillResponse {
    /// The stored record.
    pub murder: Murder,
    /// Where the client should go next.
    pub redirect: String,
}

/// Response of a rejected kill.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct KillRejectedResponse {
    /// Rule that failed.
    pub rejection: KillRejection,
    /// Form to show again, carrying the error message.
    pub form: KillForm,
}
