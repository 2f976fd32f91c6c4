use crate::domain::PositionSample;

/// Roughly 22 m of latitude.
pub const DEFAULT_THRESHOLD_DEG: f64 = 0.0002;

/// Cheap per-axis check deciding whether a sample moved far enough from the last transmitted one.
///
/// Compares raw degree deltas instead of computing a great-circle distance. Longitude degrees shrink away
/// from the equator, so the filter errs on the side of sending early.
#[derive(Clone, Copy, Debug)]
pub struct SignificanceFilter {
    threshold_deg: f64,
}

impl Default for SignificanceFilter {
    fn default() -> Self {
        SignificanceFilter::new(DEFAULT_THRESHOLD_DEG)
    }
}

impl SignificanceFilter {
    pub fn new(threshold_deg: f64) -> Self {
        SignificanceFilter { threshold_deg }
    }

    pub fn should_send(&self, sample: &PositionSample, last_sent: Option<&PositionSample>) -> bool {
        let Some(last_sent) = last_sent else {
            return true;
        };

        let latitude_delta = (sample.latitude() - last_sent.latitude()).abs();
        let longitude_delta = (sample.longitude() - last_sent.longitude()).abs();

        latitude_delta > self.threshold_deg || longitude_delta > self.threshold_deg
    }
}
