use crate::domain::Coordinate;
use chrono::{DateTime, Utc};

/// A single position reading of a vehicle. Never mutated after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionSample {
    pub vehicle_id: String,
    pub coordinate: Coordinate,
    pub captured_at: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(vehicle_id: impl Into<String>, coordinate: Coordinate) -> Self {
        PositionSample {
            vehicle_id: vehicle_id.into(),
            coordinate,
            captured_at: Utc::now(),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.coordinate.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.coordinate.longitude
    }
}
