use crate::{
    problem::{location::LocationIdx, routing_problem::RoutingProblem, vehicle::VehicleIdx},
    solution::route_evaluation::is_route_feasible,
};

const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Driven distance of a route, including the legs from the vehicle start and
/// to its end when it has one.
pub fn route_distance(problem: &RoutingProblem, vehicle_id: VehicleIdx, route: &[LocationIdx]) -> f64 {
    let Some(&first) = route.first() else {
        return 0.0;
    };

    let mut distance = problem.distance(problem.vehicle_start(vehicle_id), first);
    for window in route.windows(2) {
        distance += problem.distance(window[0], window[1]);
    }

    if let (Some(&last), Some(end)) = (route.last(), problem.vehicle_end(vehicle_id)) {
        distance += problem.distance(last, end);
    }

    distance
}

/// Distance change of reversing `route[from..=to]`.
///
/// ```text
/// BEFORE: (prev) --x--> [from] -> ... -> [to] --x--> (next)
/// AFTER:  (prev) -----> [to] -> ... -> [from] -----> (next)
/// ```
pub fn two_opt_delta(
    problem: &RoutingProblem,
    vehicle_id: VehicleIdx,
    route: &[LocationIdx],
    from: usize,
    to: usize,
) -> f64 {
    let prev = if from == 0 {
        problem.vehicle_start(vehicle_id)
    } else {
        route[from - 1]
    };
    let next = if to + 1 < route.len() {
        Some(route[to + 1])
    } else {
        problem.vehicle_end(vehicle_id)
    };

    let mut current = problem.distance(prev, route[from]);
    let mut reversed = problem.distance(prev, route[to]);
    if let Some(next) = next {
        current += problem.distance(route[to], next);
        reversed += problem.distance(route[from], next);
    }

    reversed - current
}

#[derive(Debug, Clone, Default)]
pub struct TwoOptReport {
    pub applied: usize,
    pub passes: usize,
    /// Route distance after each applied swap, starting with the initial one.
    pub distances: Vec<f64>,
}

/// Best improvement 2-opt. Each pass applies the most improving swap that
/// keeps the route feasible; stops when a pass finds none or after
/// `max_iterations` passes.
pub fn two_opt(
    problem: &RoutingProblem,
    vehicle_id: VehicleIdx,
    route: &mut Vec<LocationIdx>,
    max_iterations: usize,
) -> TwoOptReport {
    let mut report = TwoOptReport {
        distances: vec![route_distance(problem, vehicle_id, route)],
        ..TwoOptReport::default()
    };

    if route.len() < 2 {
        return report;
    }

    let mut candidate = route.clone();
    while report.passes < max_iterations {
        report.passes += 1;

        let mut improving = vec![];
        for from in 0..route.len() - 1 {
            for to in (from + 1)..route.len() {
                let delta = two_opt_delta(problem, vehicle_id, route, from, to);
                if delta < -IMPROVEMENT_EPSILON {
                    improving.push((delta, from, to));
                }
            }
        }

        improving.sort_by(|a, b| a.0.total_cmp(&b.0));

        let applied = improving.into_iter().find(|&(_, from, to)| {
            candidate.clear();
            candidate.extend_from_slice(route);
            candidate[from..=to].reverse();
            is_route_feasible(problem, vehicle_id, &candidate)
        });

        match applied {
            Some((_, from, to)) => {
                route[from..=to].reverse();
                report.applied += 1;
                report
                    .distances
                    .push(route_distance(problem, vehicle_id, route));
            }
            None => break,
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use crate::{problem::location::LocationBuilder, test_utils};

    use super::*;

    fn line_problem() -> RoutingProblem {
        let mut locations = vec![test_utils::create_depot()];
        for index in 1..=5 {
            let builder = LocationBuilder::new(
                format!("line_{index}"),
                test_utils::DEPOT_LAT,
                test_utils::DEPOT_LON + 0.05 * index as f64,
            );
            locations.push(builder.build());
        }

        test_utils::problem_from(
            locations,
            vec![test_utils::create_vehicle("v", 100.0)],
            test_utils::config(),
        )
    }

    #[test]
    fn test_delta_matches_distance_change() {
        let problem = line_problem();
        let vehicle_id = VehicleIdx::new(0);
        let route: Vec<_> = [3, 1, 2, 5, 4].into_iter().map(LocationIdx::new).collect();

        for from in 0..route.len() - 1 {
            for to in (from + 1)..route.len() {
                let mut reversed = route.clone();
                reversed[from..=to].reverse();

                let expected = route_distance(&problem, vehicle_id, &reversed)
                    - route_distance(&problem, vehicle_id, &route);
                let delta = two_opt_delta(&problem, vehicle_id, &route, from, to);
                assert!((delta - expected).abs() < 1e-6, "{from}..={to}");
            }
        }
    }

    #[test]
    fn test_never_increases_distance() {
        let problem = line_problem();
        let vehicle_id = VehicleIdx::new(0);
        let mut route: Vec<_> = [3, 1, 5, 2, 4].into_iter().map(LocationIdx::new).collect();

        let report = two_opt(&problem, vehicle_id, &mut route, 100);

        assert!(report.applied > 0);
        for pair in report.distances.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        let expected: Vec<_> = (1..=5).map(LocationIdx::new).collect();
        assert_eq!(route, expected);
    }

    #[test]
    fn test_iteration_budget() {
        let problem = line_problem();
        let mut route: Vec<_> = [5, 4, 3, 2, 1].into_iter().map(LocationIdx::new).collect();

        let report = two_opt(&problem, VehicleIdx::new(0), &mut route, 1);
        assert!(report.passes <= 1);
    }
}
