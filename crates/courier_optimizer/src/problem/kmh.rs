use jiff::SignedDuration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lower bound applied to every speed so that travel time stays finite.
pub const MIN_SPEED_KMH: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, JsonSchema)]
pub struct Kmh(f64);

impl Kmh {
    pub fn new(value: f64) -> Self {
        Kmh(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn scaled(&self, factor: f64) -> Kmh {
        Kmh(self.0 * factor)
    }

    /// Time needed to cover `distance_km` at this speed.
    pub fn travel_duration(&self, distance_km: f64) -> SignedDuration {
        if distance_km <= 0.0 {
            return SignedDuration::ZERO;
        }

        let hours = distance_km / self.0.max(MIN_SPEED_KMH);
        SignedDuration::from_secs_f64(hours * 3600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_duration() {
        assert_eq!(
            Kmh::new(60.0).travel_duration(30.0),
            SignedDuration::from_mins(30)
        );
        assert_eq!(Kmh::new(0.0).travel_duration(0.0), SignedDuration::ZERO);
        assert!(Kmh::new(0.0).travel_duration(1.0) > SignedDuration::ZERO);
    }
}
