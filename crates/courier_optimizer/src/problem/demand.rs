use std::{
    iter::Sum,
    ops::{Add, AddAssign, Sub},
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Weight (kg) and volume (m³) carried by a stop or offered by a vehicle.
#[derive(Default, Debug, PartialEq, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct Demand {
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub volume: f64,
}

/// A vehicle's capacity uses the same dimensions as a stop's demand.
pub type Capacity = Demand;

impl Demand {
    pub const ZERO: Demand = Demand {
        weight: 0.0,
        volume: 0.0,
    };

    pub fn new(weight: f64, volume: f64) -> Self {
        Demand { weight, volume }
    }

    pub fn weight(weight: f64) -> Self {
        Demand {
            weight,
            volume: 0.0,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.weight < 0.0 || self.volume < 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.weight.is_finite() && self.volume.is_finite()
    }

    /// Whether this load fits in `capacity` on every dimension.
    pub fn fits_within(&self, capacity: &Capacity) -> bool {
        self.weight <= capacity.weight && self.volume <= capacity.volume
    }

    /// Highest fill ratio across dimensions. Dimensions without capacity are ignored.
    pub fn fill_ratio(&self, capacity: &Capacity) -> f64 {
        let ratio = |used: f64, available: f64| {
            if available > 0.0 {
                used / available
            } else {
                0.0
            }
        };

        ratio(self.weight, capacity.weight).max(ratio(self.volume, capacity.volume))
    }
}

impl Add for Demand {
    type Output = Demand;

    fn add(self, other: Demand) -> Demand {
        Demand {
            weight: self.weight + other.weight,
            volume: self.volume + other.volume,
        }
    }
}

impl AddAssign for Demand {
    fn add_assign(&mut self, other: Demand) {
        self.weight += other.weight;
        self.volume += other.volume;
    }
}

impl Sub for Demand {
    type Output = Demand;

    fn sub(self, other: Demand) -> Demand {
        Demand {
            weight: self.weight - other.weight,
            volume: self.volume - other.volume,
        }
    }
}

impl Sum for Demand {
    fn sum<I: Iterator<Item = Demand>>(iter: I) -> Demand {
        iter.fold(Demand::ZERO, |acc, demand| acc + demand)
    }
}

impl<'a> Sum<&'a Demand> for Demand {
    fn sum<I: Iterator<Item = &'a Demand>>(iter: I) -> Demand {
        iter.fold(Demand::ZERO, |acc, demand| acc + *demand)
    }
}
