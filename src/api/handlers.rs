use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::api::wire::{BusNameResponse, LocationCreated, LocationRequest};
use crate::domain::{Coordinate, PositionSample, Stoppage};
use crate::ingestion::ingest;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use tracing::{info, instrument};

const ALL_FIELDS_REQUIRED: &str = "All fields are required";

#[instrument(skip_all)]
pub async fn post_location(
    State(state): State<AppState>,
    payload: Result<Json<LocationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LocationCreated>), ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::Validation(format!("{}: {}", ALL_FIELDS_REQUIRED, rejection.body_text())))?;
    let sample = validate(request)?;

    let ingested = ingest(state.repository(), state.engine(), &sample).await?;

    Ok((
        StatusCode::CREATED,
        Json(LocationCreated {
            message: "Bus location inserted successfully".to_string(),
            location_id: ingested.location_id,
        }),
    ))
}

fn validate(request: LocationRequest) -> Result<PositionSample, ApiError> {
    let (Some(bus_name), Some(latitude), Some(longitude)) = (request.bus_name, request.bus_latitude, request.bus_longitude) else {
        return Err(ApiError::Validation(ALL_FIELDS_REQUIRED.to_string()));
    };

    if bus_name.trim().is_empty() {
        return Err(ApiError::Validation(ALL_FIELDS_REQUIRED.to_string()));
    }

    let coordinate = Coordinate::new(latitude, longitude).map_err(|e| ApiError::Validation(e.to_string()))?;
    Ok(PositionSample::new(bus_name, coordinate))
}

#[derive(Debug, Serialize)]
pub struct StoppagesResponse {
    success: bool,
    stoppages: Vec<Stoppage>,
}

#[instrument(skip(state))]
pub async fn get_stoppages(State(state): State<AppState>, Path(phone): Path<String>) -> Result<Json<StoppagesResponse>, ApiError> {
    let stoppages = state.repository().stoppages_for_driver(&phone).await?;
    if stoppages.is_empty() {
        return Err(ApiError::NotFound("No stoppages found for this driver".to_string()));
    }

    Ok(Json(StoppagesResponse { success: true, stoppages }))
}

#[instrument(skip(state))]
pub async fn get_bus_name(State(state): State<AppState>, Path(phone): Path<String>) -> Result<Json<BusNameResponse>, ApiError> {
    let Some(bus_name) = state.repository().bus_name_for_driver(&phone).await? else {
        return Err(ApiError::NotFound("No driver found with this phone number".to_string()));
    };

    Ok(Json(BusNameResponse { success: true, bus_name }))
}

#[derive(Debug, Serialize)]
pub struct TripResetResponse {
    success: bool,
    route_name: String,
    stoppages_reset: usize,
}

/// Starts a new trip on a route by clearing the arrival flags of all its stops.
#[instrument(skip(state))]
pub async fn reset_trip(State(state): State<AppState>, Path(route_name): Path<String>) -> Result<Json<TripResetResponse>, ApiError> {
    let stoppages_reset = state.repository().reset_trip(&route_name).await?;
    if stoppages_reset == 0 {
        return Err(ApiError::NotFound(format!("No stoppages found for route '{}'", route_name)));
    }

    info!("🔄 Started a new trip on route '{}', cleared {} stoppage(s)", route_name, stoppages_reset);
    Ok(Json(TripResetResponse {
        success: true,
        route_name,
        stoppages_reset,
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
