mod common;

use courier_optimizer::{
    config::Algorithm,
    constraints::route_validator::ViolationKind,
    problem::{
        container::ContainerClass,
        demand::Demand,
        location::{LocationBuilder, LocationRole},
        unassigned::UnassignedReason,
        vehicle::VehicleBuilder,
        waypoint_purpose::WaypointPurpose,
    },
    solver::optimizer::optimize,
};
use jiff::{SignedDuration, Timestamp};

#[test]
fn test_single_vehicle_serves_all_deliveries() {
    let locations = vec![
        common::depot(),
        common::delivery("a", 50.87, 4.36, 50.0),
        common::delivery("b", 50.84, 4.40, 25.0),
        common::delivery("c", 50.82, 4.33, 100.0),
        common::delivery("d", 50.88, 4.30, 200.0),
    ];

    let result = optimize(
        vec![common::vehicle("van", 500.0)],
        locations,
        common::config(),
    )
    .unwrap();

    assert_eq!(result.routes.len(), 1);
    assert!(result.unassigned.is_empty());
    assert_eq!(result.summary.fulfillment, 100.0);

    let route = &result.routes[0];
    assert_eq!(route.destinations().count(), 4);
    assert_eq!(route.metrics.load, Demand::weight(375.0));
    assert!(route.metrics.load.weight <= 500.0);
    assert_eq!(route.waypoints[0].purpose, WaypointPurpose::Departure);
}

#[test]
fn test_container_restricted_city_arrival() {
    let mut city = LocationBuilder::new("center", 50.9, 4.4);
    city.set_role(LocationRole::City)
        .set_demand(Demand::weight(1_000.0));

    let mut vehicle = VehicleBuilder::default();
    vehicle
        .set_vehicle_id("box")
        .set_capacity(Demand::weight(20_000.0))
        .set_container_class(ContainerClass::FortyFoot);

    let mut config = common::config();
    config.departure_time = Some("2025-06-10T10:00:00Z".parse::<Timestamp>().unwrap());

    let result = optimize(vec![vehicle.build()], vec![common::depot(), city.build()], config).unwrap();

    let route = &result.routes[0];
    assert!(
        route
            .violations
            .iter()
            .any(|violation| violation.kind == ViolationKind::ContainerRestrictedHours)
    );
    assert!(
        route
            .warnings
            .iter()
            .any(|warning| warning.message == "consider departing after 22:00")
    );
    assert!(!route.feasible);
    assert!(result.confidence < 100.0);
    assert!(result.warnings.iter().any(|warning| warning.contains("22:00")));
}

#[test]
fn test_oversized_demands_are_unassigned() {
    let locations = vec![
        common::depot(),
        common::delivery("heavy_a", 50.87, 4.36, 700.0),
        common::delivery("heavy_b", 50.84, 4.40, 800.0),
    ];

    let result = optimize(
        vec![common::vehicle("van", 500.0), common::vehicle("truck", 600.0)],
        locations,
        common::config(),
    )
    .unwrap();

    let mut unassigned: Vec<_> = result
        .unassigned
        .iter()
        .map(|stop| stop.location_id.as_str())
        .collect();
    unassigned.sort();

    assert_eq!(unassigned, vec!["heavy_a", "heavy_b"]);
    assert!(
        result
            .unassigned
            .iter()
            .all(|stop| stop.reason == UnassignedReason::CapacityExceeded)
    );
    assert!(result.summary.fulfillment < 100.0);
    assert!(result.routes.is_empty());
}

#[test]
fn test_combined_demand_over_capacity_leaves_one_unassigned() {
    let locations = vec![
        common::depot(),
        common::delivery("half_a", 50.87, 4.36, 300.0),
        common::delivery("half_b", 50.84, 4.40, 300.0),
    ];

    let result = optimize(
        vec![common::vehicle("van", 500.0)],
        locations,
        common::config(),
    )
    .unwrap();

    assert_eq!(result.routes.len(), 1);
    assert_eq!(result.routes[0].destinations().count(), 1);
    assert_eq!(result.unassigned.len(), 1);
    assert_eq!(result.unassigned[0].reason, UnassignedReason::NotRouted);
    assert!(result.summary.fulfillment < 100.0);
}

#[test]
fn test_tiny_budget_still_returns() {
    let mut config = common::config();
    config.max_solver_duration = SignedDuration::from_millis(1);
    config.simulated_annealing.max_iterations = 1_000_000;
    config.genetic.generations = 100_000;
    config.ant_colony.iterations = 100_000;

    let started_at = Timestamp::now();
    let result = optimize(
        vec![common::vehicle("a", 300.0), common::vehicle("b", 300.0)],
        common::random_locations(25, 7),
        config,
    )
    .unwrap();
    let elapsed = Timestamp::now().duration_since(started_at);

    assert!(elapsed < SignedDuration::from_secs(5), "took {elapsed:?}");
    assert!(result.summary.degraded);
    assert!(result.confidence <= 90.0);
    assert!(
        result
            .summary
            .candidates
            .iter()
            .any(|candidate| candidate.stop_reason.is_degraded())
    );
}

#[test]
fn test_single_algorithms() {
    for algorithm in [
        Algorithm::NearestNeighbor,
        Algorithm::Savings,
        Algorithm::SimulatedAnnealing,
        Algorithm::Genetic,
        Algorithm::AntColony,
    ] {
        let mut config = common::config();
        config.algorithm = algorithm;

        let result = optimize(
            vec![common::vehicle("a", 500.0), common::vehicle("b", 500.0)],
            common::random_locations(12, 3),
            config,
        )
        .unwrap();

        assert_eq!(result.summary.fulfillment, 100.0, "{algorithm}");
        assert!(
            result
                .summary
                .candidates
                .iter()
                .any(|candidate| candidate.algorithm == algorithm)
        );
    }
}
