use fixedbitset::FixedBitSet;
use tracing::debug;

use crate::{
    constraints::route_cursor::RouteCursor,
    problem::{location::LocationIdx, routing_problem::RoutingProblem, vehicle::VehicleIdx},
    solution::{candidate_solution::CandidateSolution, insertion::repair},
};

use super::two_opt::two_opt;

/// Builds routes vehicle after vehicle, always driving to the closest stop
/// that can still be appended feasibly.
pub fn nearest_neighbor_routes(problem: &RoutingProblem) -> Vec<Vec<LocationIdx>> {
    let mut visited = FixedBitSet::with_capacity(problem.locations().len());
    let mut routes = Vec::with_capacity(problem.num_vehicles());

    for vehicle_id in VehicleIdx::range(problem.num_vehicles()) {
        let mut cursor = RouteCursor::start(problem, vehicle_id);
        let mut route = vec![];

        loop {
            let position = cursor.position();
            let next = problem
                .routable_stops()
                .iter()
                .copied()
                .filter(|stop| !visited.contains(stop.get()))
                .filter(|&stop| cursor.can_append(stop))
                .min_by(|&a, &b| {
                    problem
                        .distance(position, a)
                        .total_cmp(&problem.distance(position, b))
                        .then(a.cmp(&b))
                });

            let Some(stop) = next else {
                break;
            };

            cursor.push_stop(stop);
            visited.insert(stop.get());
            route.push(stop);
        }

        routes.push(route);
    }

    routes
}

/// Nearest neighbor construction improved by 2-opt, then repaired.
pub fn nearest_neighbor(problem: &RoutingProblem) -> CandidateSolution {
    let mut routes = nearest_neighbor_routes(problem);

    let max_iterations = problem.config().two_opt_max_iterations;
    for (index, route) in routes.iter_mut().enumerate() {
        let report = two_opt(problem, VehicleIdx::new(index), route, max_iterations);
        if report.applied > 0 {
            debug!(
                vehicle = index,
                swaps = report.applied,
                "2-opt improved nearest neighbor route"
            );
        }
    }

    let mut solution = CandidateSolution::from_routes(problem, routes);
    repair(problem, &mut solution);

    solution
}
