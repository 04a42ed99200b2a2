use jiff::{SignedDuration, Timestamp, civil, tz::TimeZone};

use crate::{
    config::CostParameters,
    problem::{kmh::Kmh, location::Location, vehicle::Vehicle},
};

/// Distances below this are treated as zero by the cost model.
pub const DISTANCE_EPSILON_KM: f64 = 1e-9;

/// Great-circle distance between two locations in kilometers.
pub fn distance(from: &Location, to: &Location) -> f64 {
    from.haversine_km(to)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelTime {
    pub duration: SignedDuration,
    /// Duration at base speed, without rush hour slowdown.
    pub free_flow: SignedDuration,
    pub rush_delay: SignedDuration,
}

impl TravelTime {
    pub const ZERO: TravelTime = TravelTime {
        duration: SignedDuration::ZERO,
        free_flow: SignedDuration::ZERO,
        rush_delay: SignedDuration::ZERO,
    };
}

/// Monetary breakdown of driving `distance` in `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostBreakdown {
    pub fuel: f64,
    pub wage: f64,
    pub maintenance: f64,
    pub toll: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.fuel + self.wage + self.maintenance + self.toll
    }
}

/// Time-of-day aware travel, cost and emission model evaluated in the
/// request's time zone.
#[derive(Debug, Clone)]
pub struct CostModel {
    params: CostParameters,
    time_zone: TimeZone,
    avoid_tolls: bool,
}

impl CostModel {
    pub fn new(params: CostParameters, time_zone: TimeZone, avoid_tolls: bool) -> Self {
        CostModel {
            params,
            time_zone,
            avoid_tolls,
        }
    }

    pub fn params(&self) -> &CostParameters {
        &self.params
    }

    pub fn time_zone(&self) -> &TimeZone {
        &self.time_zone
    }

    pub fn local_time(&self, timestamp: Timestamp) -> civil::Time {
        self.time_zone.to_datetime(timestamp).time()
    }

    pub fn is_rush_hour(&self, timestamp: Timestamp) -> bool {
        let local = self.local_time(timestamp);
        self.params
            .rush_hour_windows
            .iter()
            .any(|window| window.contains(local))
    }

    pub fn base_speed(&self, distance_km: f64) -> Kmh {
        if distance_km < self.params.highway_threshold_km {
            Kmh::new(self.params.city_speed_kmh)
        } else {
            Kmh::new(self.params.highway_speed_kmh)
        }
    }

    /// Travel time for a leg started at `departure`. The rush hour factor
    /// applies when the departure falls in a rush window.
    pub fn travel_time(&self, distance_km: f64, departure: Timestamp) -> TravelTime {
        if distance_km <= DISTANCE_EPSILON_KM {
            return TravelTime::ZERO;
        }

        let base_speed = self.base_speed(distance_km);
        let free_flow = base_speed.travel_duration(distance_km);

        let duration = if self.is_rush_hour(departure) {
            base_speed
                .scaled(self.params.rush_hour_factor)
                .travel_duration(distance_km)
        } else {
            free_flow
        };

        TravelTime {
            duration,
            free_flow,
            rush_delay: duration - free_flow,
        }
    }

    pub fn cost_breakdown(
        &self,
        distance_km: f64,
        duration: SignedDuration,
        vehicle: &Vehicle,
    ) -> CostBreakdown {
        let distance_km = distance_km.max(0.0);
        let hours = duration.as_secs_f64().max(0.0) / 3600.0;

        CostBreakdown {
            fuel: self.fuel(distance_km, vehicle) * self.params.fuel_price_per_liter,
            wage: hours * vehicle.rates().per_hour,
            maintenance: distance_km * vehicle.rates().per_km,
            toll: if self.avoid_tolls {
                0.0
            } else {
                distance_km * self.params.toll_rate_per_km
            },
        }
    }

    /// Variable cost of driving `distance_km` in `duration`. The vehicle fixed
    /// cost is not included.
    pub fn cost(&self, distance_km: f64, duration: SignedDuration, vehicle: &Vehicle) -> f64 {
        self.cost_breakdown(distance_km, duration, vehicle).total()
    }

    /// CO2 in kilograms.
    pub fn emissions(&self, distance_km: f64, vehicle: &Vehicle) -> f64 {
        distance_km.max(0.0) * vehicle.co2_kg_per_km().unwrap_or(self.params.co2_kg_per_km)
    }

    /// Fuel burned in liters.
    pub fn fuel(&self, distance_km: f64, vehicle: &Vehicle) -> f64 {
        distance_km.max(0.0) * vehicle.fuel_liters_per_km()
    }

    /// First instant at or after `after` whose local clock reads `time`.
    pub fn next_occurrence(&self, after: Timestamp, time: civil::Time) -> Option<Timestamp> {
        let local = self.time_zone.to_datetime(after);
        let mut candidate = local.date().to_datetime(time);
        if candidate < local {
            candidate = local.date().tomorrow().ok()?.to_datetime(time);
        }

        candidate
            .to_zoned(self.time_zone.clone())
            .ok()
            .map(|zoned| zoned.timestamp())
    }
}
