use jiff::{SignedDuration, Timestamp};

use crate::{
    config::OptimizationConfig,
    problem::{
        demand::Demand,
        location::{Location, LocationBuilder, LocationRole},
        routing_problem::RoutingProblem,
        vehicle::{Vehicle, VehicleBuilder},
    },
};

pub const DEPOT_LAT: f64 = 50.85;
pub const DEPOT_LON: f64 = 4.35;

/// Tuesday noon UTC, outside every default rush window.
pub fn departure() -> Timestamp {
    "2025-06-10T12:00:00Z".parse().unwrap()
}

pub fn config() -> OptimizationConfig {
    let mut config = OptimizationConfig {
        departure_time: Some(departure()),
        max_solver_duration: SignedDuration::from_secs(5),
        max_unimproved_duration: SignedDuration::from_secs(5),
        ..OptimizationConfig::default()
    };
    config.simulated_annealing.max_iterations = 2_000;
    config.genetic.generations = 30;
    config.genetic.population_size = 16;
    config.ant_colony.iterations = 20;
    config.ant_colony.ants = 8;

    config
}

pub fn create_depot() -> Location {
    let mut builder = LocationBuilder::new("depot", DEPOT_LAT, DEPOT_LON);
    builder.set_role(LocationRole::Depot);
    builder.build()
}

/// A depot followed by one delivery per weight, spread on a small ring
/// around it.
pub fn create_locations(weights: &[f64]) -> Vec<Location> {
    let mut locations = vec![create_depot()];

    for (index, &weight) in weights.iter().enumerate() {
        let angle = index as f64 * std::f64::consts::TAU / weights.len().max(1) as f64;
        let radius = 0.02 + 0.01 * (index % 3) as f64;
        let mut builder = LocationBuilder::new(
            format!("stop_{index}"),
            DEPOT_LAT + radius * angle.cos(),
            DEPOT_LON + 1.5 * radius * angle.sin(),
        );
        builder
            .set_demand(Demand::weight(weight))
            .set_service_duration(SignedDuration::from_mins(5));
        locations.push(builder.build());
    }

    locations
}

pub fn create_vehicle(id: &str, capacity: f64) -> Vehicle {
    let mut builder = VehicleBuilder::default();
    builder
        .set_vehicle_id(id)
        .set_capacity(Demand::weight(capacity));
    builder.build()
}

pub fn create_vehicles(capacities: &[f64]) -> Vec<Vehicle> {
    capacities
        .iter()
        .enumerate()
        .map(|(index, &capacity)| create_vehicle(&format!("vehicle_{index}"), capacity))
        .collect()
}

pub fn problem_from(
    locations: Vec<Location>,
    vehicles: Vec<Vehicle>,
    config: OptimizationConfig,
) -> RoutingProblem {
    RoutingProblem::new(vehicles, locations, config).unwrap()
}

pub fn create_problem(weights: &[f64], capacities: &[f64]) -> RoutingProblem {
    problem_from(
        create_locations(weights),
        create_vehicles(capacities),
        config(),
    )
}

/// Depot and five stops about 111 km apart heading north, enough driving
/// to require a break.
pub fn create_far_problem() -> RoutingProblem {
    let mut locations = vec![create_depot()];
    for index in 1..=5 {
        let mut builder =
            LocationBuilder::new(format!("far_{index}"), DEPOT_LAT + index as f64, DEPOT_LON);
        builder.set_demand(Demand::weight(10.0));
        locations.push(builder.build());
    }

    problem_from(locations, vec![create_vehicle("truck", 1_000.0)], config())
}
