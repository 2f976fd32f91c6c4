use thiserror::Error;

/// A point on the earth in signed decimal degrees.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting non-finite and out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(latitude >= -90.0 && latitude <= 90.0) {
            return Err(CoordinateError::InvalidLatitude(latitude));
        }

        if !(longitude >= -180.0 && longitude <= 180.0) {
            return Err(CoordinateError::InvalidLongitude(longitude));
        }

        Ok(Coordinate { latitude, longitude })
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum CoordinateError {
    #[error("invalid latitude: {0}, must be between -90 and 90")]
    InvalidLatitude(f64),
    #[error("invalid longitude: {0}, must be between -180 and 180")]
    InvalidLongitude(f64),
}
