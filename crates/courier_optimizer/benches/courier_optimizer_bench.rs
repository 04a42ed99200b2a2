use std::hint::black_box;

use courier_optimizer::{
    config::OptimizationConfig,
    construction::{clarke_wright::clarke_wright, nearest_neighbor::nearest_neighbor},
    metaheuristics::{search_context::SearchContext, simulated_annealing::simulated_annealing},
    problem::{
        demand::Demand,
        location::{Location, LocationBuilder, LocationRole},
        routing_problem::RoutingProblem,
        travel_matrix::TravelMatrix,
        vehicle::{Vehicle, VehicleBuilder},
    },
};
use criterion::{Criterion, criterion_group, criterion_main};
use jiff::{SignedDuration, Timestamp};
use rand::{Rng, SeedableRng, rngs::SmallRng};

fn locations(count: usize) -> Vec<Location> {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut depot = LocationBuilder::new("depot", 50.85, 4.35);
    depot.set_role(LocationRole::Depot);

    let mut locations = vec![depot.build()];
    for index in 0..count {
        let mut builder = LocationBuilder::new(
            format!("stop_{index}"),
            50.85 + rng.random_range(-0.2..0.2),
            4.35 + rng.random_range(-0.3..0.3),
        );
        builder
            .set_demand(Demand::weight(rng.random_range(5.0..50.0)))
            .set_service_duration(SignedDuration::from_mins(5));
        locations.push(builder.build());
    }

    locations
}

fn vehicles(count: usize) -> Vec<Vehicle> {
    (0..count)
        .map(|index| {
            let mut builder = VehicleBuilder::default();
            builder
                .set_vehicle_id(format!("vehicle_{index}"))
                .set_capacity(Demand::weight(400.0));
            builder.build()
        })
        .collect()
}

fn problem(stops: usize, fleet: usize) -> RoutingProblem {
    let mut config = OptimizationConfig {
        departure_time: "2025-06-10T06:00:00Z".parse::<Timestamp>().ok(),
        ..OptimizationConfig::default()
    };
    config.simulated_annealing.max_iterations = 500;

    RoutingProblem::new(vehicles(fleet), locations(stops), config).unwrap()
}

fn travel_matrix_benchmark(c: &mut Criterion) {
    let locations = locations(500);
    c.bench_function("haversine matrix (500)", |b| {
        b.iter(|| TravelMatrix::from_haversine(black_box(&locations)))
    });
}

fn construction_benchmark(c: &mut Criterion) {
    let problem = problem(80, 8);

    c.bench_function("nearest neighbor (80 stops)", |b| {
        b.iter(|| nearest_neighbor(black_box(&problem)))
    });

    c.bench_function("clarke wright (80 stops)", |b| {
        b.iter(|| clarke_wright(black_box(&problem)))
    });
}

fn annealing_benchmark(c: &mut Criterion) {
    let problem = problem(40, 4);
    let initial = nearest_neighbor(&problem);

    c.bench_function("simulated annealing (40 stops, 500 iterations)", |b| {
        b.iter(|| simulated_annealing(&SearchContext::new(&problem), black_box(initial.clone())))
    });
}

criterion_group!(
    benches,
    travel_matrix_benchmark,
    construction_benchmark,
    annealing_benchmark
);
criterion_main!(benches);
