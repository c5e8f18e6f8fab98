//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::station::{Station, StationId};

/// Query for the all-stations listing.
#[derive(Debug, Default, Deserialize)]
pub struct AllStationsQuery {
    /// Only include public stations (defaults to true)
    pub public_only: Option<bool>,
}

impl AllStationsQuery {
    pub fn public_only(&self) -> bool {
        self.public_only.unwrap_or(true)
    }
}

/// Station record sent by the worker with every write.
#[derive(Debug, Clone, Deserialize)]
pub struct StationRecord {
    /// Short name the payload is stored under
    pub short_name: String,
    /// Whether the station shows up in public listings
    pub is_public: bool,
}

impl StationRecord {
    /// Attach the station ID taken from the request path.
    pub fn into_station(self, id: StationId) -> Station {
        Station {
            id,
            short_name: self.short_name,
            is_public: self.is_public,
        }
    }
}

/// Body of a now-playing write.
#[derive(Debug, Clone, Deserialize)]
pub struct SetNowPlayingRequest {
    #[serde(flatten)]
    pub station: StationRecord,
    /// Payload to serve; `null` or absent means nothing is playing
    #[serde(default)]
    pub now_playing: Option<Value>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
