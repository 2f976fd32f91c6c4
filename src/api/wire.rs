use crate::domain::PositionSample;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/bus/location`. Fields are optional so that a missing one is reported as a
/// validation error instead of a deserialization failure.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LocationRequest {
    pub bus_name: Option<String>,
    pub bus_latitude: Option<f64>,
    pub bus_longitude: Option<f64>,
}

impl From<&PositionSample> for LocationRequest {
    fn from(sample: &PositionSample) -> Self {
        LocationRequest {
            bus_name: Some(sample.vehicle_id.clone()),
            bus_latitude: Some(sample.latitude()),
            bus_longitude: Some(sample.longitude()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LocationCreated {
    pub message: String,
    pub location_id: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct BusNameResponse {
    pub success: bool,
    pub bus_name: String,
}
