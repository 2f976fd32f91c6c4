use crate::domain::{Coordinate, Stop};
use crate::geofence::distance;
use crate::store::{LocationRepository, StoreError};
use tracing::{debug, info, instrument};

/// Radius around every stop within which a vehicle counts as arrived.
pub const DEFAULT_RADIUS_M: f64 = 200.0;

#[derive(Clone, Copy, Debug)]
pub struct GeofenceEngine {
    radius_m: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// This evaluation flipped the stop's arrival flag.
    Arrived,
    /// The stop was already marked, nothing changed.
    AlreadyArrived,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Arrival {
    pub stop: Stop,
    pub distance_m: f64,
    pub transition: Transition,
}

impl Default for GeofenceEngine {
    fn default() -> Self {
        GeofenceEngine::new(DEFAULT_RADIUS_M)
    }
}

impl GeofenceEngine {
    pub fn new(radius_m: f64) -> Self {
        GeofenceEngine { radius_m }
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// Returns the first stop within the radius together with its distance.
    ///
    /// Stops that are already arrived stay candidates, so an arrived stop overlapping a pending one is
    /// reported instead of the pending one when it comes first.
    pub fn find_match<'a>(&self, position: &Coordinate, stops: &'a [Stop]) -> Option<(&'a Stop, f64)> {
        stops
            .iter()
            .map(|stop| (stop, distance(position, &stop.coordinate)))
            .find(|(_, distance_m)| *distance_m <= self.radius_m)
    }

    /// Matches `position` against `stops` and persists the arrival of the matched stop.
    #[instrument(skip_all, fields(latitude = position.latitude, longitude = position.longitude))]
    pub async fn evaluate(
        &self,
        position: &Coordinate,
        stops: &[Stop],
        repository: &dyn LocationRepository,
    ) -> Result<Option<Arrival>, StoreError> {
        let Some((stop, distance_m)) = self.find_match(position, stops) else {
            debug!("📍 No stop within {} m of the vehicle", self.radius_m);
            return Ok(None);
        };

        let transition = if repository.mark_arrived(stop.id).await? {
            info!(stop = stop.name, route = stop.route_name, "🚏 Arrived at stop '{}' ({:.0} m)", stop.name, distance_m);
            Transition::Arrived
        } else {
            debug!(stop = stop.name, "🚏 Stop '{}' already marked as arrived", stop.name);
            Transition::AlreadyArrived
        };

        Ok(Some(Arrival {
            stop: Stop { arrived: true, ..stop.clone() },
            distance_m,
            transition,
        }))
    }
}
