mod coordinate;
mod position;
mod stop;

pub use coordinate::{Coordinate, CoordinateError};
pub use position::PositionSample;
pub use stop::{Stop, Stoppage};
