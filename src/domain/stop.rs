use crate::domain::Coordinate;
use serde::Serialize;

/// A stop on a route together with its arrival flag for the current trip.
#[derive(Clone, Debug, PartialEq)]
pub struct Stop {
    pub id: i64,
    pub route_name: String,
    pub name: String,
    pub ordinal: i64,
    pub coordinate: Coordinate,
    pub arrived: bool,
}

/// Stop as exposed to the driver app.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Stoppage {
    pub route_name: String,
    pub stoppage_name: String,
    pub stoppage_latitude: f64,
    pub stoppage_longitude: f64,
    pub stoppage_number: i64,
    pub has_arrived: bool,
}

impl From<Stop> for Stoppage {
    fn from(stop: Stop) -> Self {
        Stoppage {
            route_name: stop.route_name,
            stoppage_name: stop.name,
            stoppage_latitude: stop.coordinate.latitude,
            stoppage_longitude: stop.coordinate.longitude,
            stoppage_number: stop.ordinal,
            has_arrived: stop.arrived,
        }
    }
}
