use tracing::debug;

use crate::problem::{
    location::LocationIdx, routing_problem::RoutingProblem, vehicle::VehicleIdx,
};

use super::{candidate_solution::CandidateSolution, route_evaluation::is_route_feasible};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Insertion {
    pub vehicle_id: VehicleIdx,
    pub position: usize,
    /// Added distance in kilometers.
    pub delta_km: f64,
}

/// Extra distance of placing `stop` at `position` of `route`.
pub fn insertion_delta(
    problem: &RoutingProblem,
    vehicle_id: VehicleIdx,
    route: &[LocationIdx],
    position: usize,
    stop: LocationIdx,
) -> f64 {
    let previous = if position == 0 {
        problem.vehicle_start(vehicle_id)
    } else {
        route[position - 1]
    };
    let next = if position < route.len() {
        Some(route[position])
    } else {
        problem.vehicle_end(vehicle_id)
    };

    match next {
        Some(next) => {
            problem.distance(previous, stop) + problem.distance(stop, next)
                - problem.distance(previous, next)
        }
        None => problem.distance(previous, stop),
    }
}

/// Cheapest feasible position for `stop` over every vehicle. Candidates are
/// ranked by added distance and the first feasible one wins.
pub fn best_insertion(
    problem: &RoutingProblem,
    solution: &CandidateSolution,
    stop: LocationIdx,
) -> Option<Insertion> {
    let mut candidates = vec![];
    for vehicle_id in VehicleIdx::range(problem.num_vehicles()) {
        if !problem.is_compatible(vehicle_id, stop) {
            continue;
        }

        let route = solution.route(vehicle_id);
        for position in 0..=route.len() {
            candidates.push(Insertion {
                vehicle_id,
                position,
                delta_km: insertion_delta(problem, vehicle_id, route, position, stop),
            });
        }
    }

    candidates.sort_by(|a, b| a.delta_km.total_cmp(&b.delta_km));

    let mut buffer = Vec::new();
    candidates.into_iter().find(|insertion| {
        let route = solution.route(insertion.vehicle_id);
        buffer.clear();
        buffer.extend_from_slice(&route[..insertion.position]);
        buffer.push(stop);
        buffer.extend_from_slice(&route[insertion.position..]);

        is_route_feasible(problem, insertion.vehicle_id, &buffer)
    })
}

pub fn apply_insertion(solution: &mut CandidateSolution, insertion: Insertion, stop: LocationIdx) {
    solution
        .route_mut(insertion.vehicle_id)
        .insert(insertion.position, stop);
    solution.mark_assigned(stop);
}

/// Inserts every unassigned stop at its cheapest feasible position, in
/// request order. Stops that fit nowhere stay unassigned.
pub fn repair(problem: &RoutingProblem, solution: &mut CandidateSolution) {
    let mut unassigned = solution.unassigned().to_vec();
    unassigned.sort();

    let mut inserted = 0;
    for stop in unassigned {
        if let Some(insertion) = best_insertion(problem, solution, stop) {
            apply_insertion(solution, insertion, stop);
            inserted += 1;
        }
    }

    if inserted > 0 {
        debug!(
            inserted,
            remaining = solution.unassigned().len(),
            "Repaired solution"
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::{solution::route_evaluation::is_route_feasible, test_utils};

    use super::*;

    #[test]
    fn test_insertion_delta_open_route() {
        let problem = test_utils::create_problem(&[10.0, 10.0], &[100.0]);
        let vehicle_id = VehicleIdx::new(0);
        let start = problem.vehicle_start(vehicle_id);
        let a = LocationIdx::new(1);
        let b = LocationIdx::new(2);

        assert_eq!(
            insertion_delta(&problem, vehicle_id, &[], 0, a),
            problem.distance(start, a)
        );

        let delta = insertion_delta(&problem, vehicle_id, &[a], 1, b);
        assert_eq!(delta, problem.distance(a, b));
    }

    #[test]
    fn test_repair_respects_capacity() {
        let problem = test_utils::create_problem(&[300.0, 300.0, 150.0], &[500.0, 200.0]);
        let mut solution = CandidateSolution::empty(&problem);

        repair(&problem, &mut solution);

        assert!(solution.is_partition(&problem));
        assert_eq!(solution.unassigned().len(), 1);
        for (vehicle_id, route) in solution.non_empty_routes() {
            assert!(is_route_feasible(&problem, vehicle_id, route));
        }
    }
}
