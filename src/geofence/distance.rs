use crate::domain::Coordinate;

/// Mean earth radius used by the spherical approximation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two coordinates (haversine).
///
/// Inputs are expected to be valid coordinates. NaN propagates to the result, so callers validate first.
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1_rad = a.latitude.to_radians();
    let lat2_rad = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn coordinate(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate { latitude, longitude }
    }

    #[rstest]
    #[case(coordinate(26.1840, 91.7400))]
    #[case(coordinate(0.0, 0.0))]
    #[case(coordinate(-33.8688, 151.2093))]
    fn distance_to_itself_is_zero(#[case] point: Coordinate) {
        assert_eq!(distance(&point, &point), 0.0);
    }

    #[rstest]
    #[case(coordinate(26.1840, 91.7400), coordinate(26.2000, 91.8000))]
    #[case(coordinate(51.8615899, 4.3580323), coordinate(52.3676, 4.9041))]
    #[case(coordinate(-10.0, 170.0), coordinate(10.0, -170.0))]
    fn distance_is_symmetric(#[case] a: Coordinate, #[case] b: Coordinate) {
        assert!((distance(&a, &b) - distance(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn two_hundred_meters_north() {
        let result = distance(&coordinate(26.1840, 91.7400), &coordinate(26.1858, 91.7400));

        assert!((result - 200.0).abs() <= 2.0, "expected ~200 m, got {result}");
    }

    #[test]
    fn nearby_bus_is_about_fourteen_meters_away() {
        let result = distance(&coordinate(26.1840, 91.7400), &coordinate(26.1841, 91.7401));

        assert!(result > 10.0 && result < 20.0, "expected ~14 m, got {result}");
    }

    #[test]
    fn nan_input_propagates() {
        assert!(distance(&coordinate(f64::NAN, 0.0), &coordinate(0.0, 0.0)).is_nan());
    }
}
