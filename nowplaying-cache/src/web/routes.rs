//! HTTP route handlers.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_http::trace::TraceLayer;

use crate::error::CacheError;
use crate::lookup::LookupIndex;
use crate::station::{InvalidStationRef, Station, StationId, StationRef};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/nowplaying", get(all_stations))
        .route("/api/nowplaying/:station", get(one_station).put(set_station))
        .route("/api/nowplaying/:station/force-update", post(force_update))
        .route("/api/lookup", get(lookup))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Now-playing payloads for every cached station.
async fn all_stations(
    State(state): State<AppState>,
    Query(query): Query<AllStationsQuery>,
) -> Result<Json<Vec<Value>>, AppError> {
    let payloads = state
        .cache
        .get_for_all_stations(query.public_only())
        .await?;
    Ok(Json(payloads))
}

/// Now-playing payload for one station, by ID or short name.
async fn one_station(
    State(state): State<AppState>,
    Path(station): Path<String>,
) -> Result<Json<Value>, AppError> {
    let station_ref = StationRef::parse(&station).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;

    state
        .cache
        .get_for_station(station_ref)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound {
            message: format!("no now-playing data for station {station}"),
        })
}

/// Store the worker's payload for the station with the ID in the path.
async fn set_station(
    State(state): State<AppState>,
    Path(station): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let request: SetNowPlayingRequest = parse_body(&body)?;
    let station = checked_station(&station, request.station)?;
    state
        .cache
        .set_for_station(&station, request.now_playing.as_ref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Queue the station with the ID in the path for an early refresh.
async fn force_update(
    State(state): State<AppState>,
    Path(station): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let station = checked_station(&station, parse_body(&body)?)?;
    state.cache.force_update(&station).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest {
        message: format!("invalid request body: {e}"),
    })
}

/// Writes address stations by ID only; the short name comes from the body.
fn checked_station(raw_id: &str, record: StationRecord) -> Result<Station, AppError> {
    let id: StationId = raw_id.parse().map_err(|e: InvalidStationRef| AppError::BadRequest {
        message: e.to_string(),
    })?;
    if record.short_name.is_empty() {
        return Err(AppError::BadRequest {
            message: "short_name must not be empty".to_string(),
        });
    }
    Ok(record.into_station(id))
}

/// The lookup index.
async fn lookup(State(state): State<AppState>) -> Result<Json<LookupIndex>, AppError> {
    Ok(Json(state.cache.get_lookup().await?))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<CacheError> for AppError {
    fn from(e: CacheError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            tracing::error!(%status, %message, "request failed");
        } else {
            tracing::debug!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
