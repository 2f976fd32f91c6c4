use crate::domain::PositionSample;
use crate::geofence::{Arrival, GeofenceEngine};
use crate::store::{LocationRepository, StoreError};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, PartialEq)]
pub struct Ingested {
    pub location_id: i64,
    pub arrival: Option<Arrival>,
}

#[derive(Error, Debug)]
pub enum IngestError {
    /// The trace row was stored but the bus has no route, or a route without stops, to evaluate against.
    #[error("no route found for bus '{bus_name}'")]
    RouteNotFound { bus_name: String },
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Persists a position update and runs the geofence over the stops of the bus's active route.
///
/// Trace append and arrival evaluation are separate writes. A failing append stops the whole update, a
/// failure after the append leaves the trace row in place.
#[instrument(skip_all, fields(bus_name = %sample.vehicle_id))]
pub async fn ingest(
    repository: &dyn LocationRepository,
    engine: &GeofenceEngine,
    sample: &PositionSample,
) -> Result<Ingested, IngestError> {
    let location_id = repository.append_trace(sample).await?;
    debug!(location_id, "📥 Stored location ({}, {})", sample.latitude(), sample.longitude());

    let route_not_found = || {
        warn!(location_id, "⚠️ No route found for bus '{}', skipping arrival check", sample.vehicle_id);
        IngestError::RouteNotFound {
            bus_name: sample.vehicle_id.clone(),
        }
    };

    let Some(route_name) = repository.active_route(&sample.vehicle_id).await? else {
        return Err(route_not_found());
    };

    let stops = repository.stops_for_route(&route_name).await?;
    if stops.is_empty() {
        return Err(route_not_found());
    }

    let arrival = engine.evaluate(&sample.coordinate, &stops, repository).await?;

    if let Some(arrival) = &arrival {
        info!(location_id, route = route_name, "📥 Bus '{}' is at stop '{}'", sample.vehicle_id, arrival.stop.name);
    }

    Ok(Ingested { location_id, arrival })
}
