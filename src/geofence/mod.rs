mod distance;
mod engine;

pub use distance::{EARTH_RADIUS_M, distance};
pub use engine::{Arrival, DEFAULT_RADIUS_M, GeofenceEngine, Transition};
