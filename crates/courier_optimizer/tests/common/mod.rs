#![allow(dead_code)]

use courier_optimizer::{
    config::OptimizationConfig,
    problem::{
        demand::Demand,
        location::{Location, LocationBuilder, LocationRole},
        vehicle::{Vehicle, VehicleBuilder},
    },
};
use jiff::{SignedDuration, Timestamp};
use rand::{Rng, SeedableRng, rngs::SmallRng};

pub const DEPOT_LAT: f64 = 50.85;
pub const DEPOT_LON: f64 = 4.35;

pub fn departure() -> Timestamp {
    "2025-06-10T12:00:00Z".parse().unwrap()
}

/// Small search parameters so every algorithm finishes on its iteration
/// limits well before the time budgets.
pub fn config() -> OptimizationConfig {
    let mut config = OptimizationConfig {
        departure_time: Some(departure()),
        max_solver_duration: SignedDuration::from_secs(60),
        max_unimproved_duration: SignedDuration::from_secs(60),
        ..OptimizationConfig::default()
    };
    config.simulated_annealing.max_iterations = 1_500;
    config.genetic.generations = 25;
    config.genetic.population_size = 16;
    config.ant_colony.iterations = 15;
    config.ant_colony.ants = 8;

    config
}

pub fn depot() -> Location {
    let mut builder = LocationBuilder::new("depot", DEPOT_LAT, DEPOT_LON);
    builder.set_role(LocationRole::Depot);
    builder.build()
}

pub fn delivery(id: &str, lat: f64, lon: f64, weight: f64) -> Location {
    let mut builder = LocationBuilder::new(id, lat, lon);
    builder
        .set_demand(Demand::weight(weight))
        .set_service_duration(SignedDuration::from_mins(5));
    builder.build()
}

pub fn vehicle(id: &str, capacity: f64) -> Vehicle {
    let mut builder = VehicleBuilder::default();
    builder.set_vehicle_id(id).set_capacity(Demand::weight(capacity));
    builder.build()
}

/// A depot and `count` deliveries scattered within about 15 km of it.
pub fn random_locations(count: usize, seed: u64) -> Vec<Location> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut locations = vec![depot()];

    for index in 0..count {
        locations.push(delivery(
            &format!("stop_{index}"),
            DEPOT_LAT + rng.random_range(-0.12..0.12),
            DEPOT_LON + rng.random_range(-0.18..0.18),
            rng.random_range(5.0..60.0_f64).round(),
        ));
    }

    locations
}
