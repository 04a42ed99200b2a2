use jiff::SignedDuration;

use crate::{
    config::ObjectiveWeights,
    constraints::route_cursor::{Infeasibility, RouteCursor},
    problem::{
        demand::Demand, location::LocationIdx, routing_problem::RoutingProblem,
        vehicle::VehicleIdx,
    },
};

use super::candidate_solution::CandidateSolution;

/// Search cost added per stop left unassigned.
pub const UNASSIGNED_PENALTY: f64 = 10_000.0;
/// Search cost added per route breaking an enforced constraint.
pub const INFEASIBLE_PENALTY: f64 = 100_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEvaluation {
    pub distance_km: f64,
    pub duration: SignedDuration,
    pub driving: SignedDuration,
    pub rush_delay: SignedDuration,
    pub cost: f64,
    pub co2_kg: f64,
    pub fuel_liters: f64,
    pub load: Demand,
    pub utilization: f64,
    pub infeasibility: Option<Infeasibility>,
}

impl RouteEvaluation {
    pub const EMPTY: RouteEvaluation = RouteEvaluation {
        distance_km: 0.0,
        duration: SignedDuration::ZERO,
        driving: SignedDuration::ZERO,
        rush_delay: SignedDuration::ZERO,
        cost: 0.0,
        co2_kg: 0.0,
        fuel_liters: 0.0,
        load: Demand::ZERO,
        utilization: 0.0,
        infeasibility: None,
    };

    pub fn is_feasible(&self) -> bool {
        self.infeasibility.is_none()
    }
}

/// Simulates the route of `vehicle_id` through `stops`. The first enforced
/// rule broken along the way is kept in `infeasibility`.
pub fn evaluate_route(
    problem: &RoutingProblem,
    vehicle_id: VehicleIdx,
    stops: &[LocationIdx],
) -> RouteEvaluation {
    if stops.is_empty() {
        return RouteEvaluation::EMPTY;
    }

    let vehicle = problem.vehicle(vehicle_id);
    let cost_model = problem.cost_model();
    let mut cursor = RouteCursor::start(problem, vehicle_id);

    let mut infeasibility = None;
    for &stop in stops {
        let (_, broken) = cursor.push_stop(stop);
        infeasibility = infeasibility.or(broken);
    }
    infeasibility = infeasibility.or(cursor.finish());

    let distance_km = cursor.distance_km();
    let duration = cursor.elapsed();

    RouteEvaluation {
        distance_km,
        duration,
        driving: cursor.driving(),
        rush_delay: cursor.rush_delay(),
        cost: cost_model.cost(distance_km, duration, vehicle) + vehicle.rates().fixed,
        co2_kg: cost_model.emissions(distance_km, vehicle),
        fuel_liters: cost_model.fuel(distance_km, vehicle),
        load: cursor.load(),
        utilization: cursor.load().fill_ratio(vehicle.capacity()),
        infeasibility,
    }
}

/// Feasibility of a whole route, stopping at the first broken rule.
pub fn check_route(
    problem: &RoutingProblem,
    vehicle_id: VehicleIdx,
    stops: &[LocationIdx],
) -> Result<(), Infeasibility> {
    if stops.is_empty() {
        return Ok(());
    }

    let mut cursor = RouteCursor::start(problem, vehicle_id);
    for &stop in stops {
        if let (_, Some(infeasibility)) = cursor.push_stop(stop) {
            return Err(infeasibility);
        }
    }

    match cursor.finish() {
        Some(infeasibility) => Err(infeasibility),
        None => Ok(()),
    }
}

pub fn is_route_feasible(
    problem: &RoutingProblem,
    vehicle_id: VehicleIdx,
    stops: &[LocationIdx],
) -> bool {
    check_route(problem, vehicle_id, stops).is_ok()
}

/// Aggregated objectives of a candidate solution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolutionMetrics {
    pub distance_km: f64,
    pub duration: SignedDuration,
    pub cost: f64,
    pub co2_kg: f64,
    pub fuel_liters: f64,
    /// Mean fill ratio of the used vehicles.
    pub utilization: f64,
    pub assigned: usize,
    pub unassigned: usize,
    pub infeasible_routes: usize,
}

impl SolutionMetrics {
    pub fn hours(&self) -> f64 {
        self.duration.as_secs_f64() / 3600.0
    }

    /// Scalar minimized by the metaheuristics: weighted objectives plus
    /// penalties for unassigned stops and infeasible routes.
    pub fn search_cost(&self, weights: &ObjectiveWeights) -> f64 {
        let total = weights.total();
        let normalized = |weight: f64| if total > 0.0 { weight / total } else { 0.2 };

        normalized(weights.minimize_distance) * self.distance_km
            + normalized(weights.minimize_time) * self.hours() * 60.0
            + normalized(weights.minimize_cost) * self.cost
            + normalized(weights.minimize_emissions) * self.co2_kg
            - normalized(weights.maximize_utilization) * self.utilization * 100.0
            + UNASSIGNED_PENALTY * self.unassigned as f64
            + INFEASIBLE_PENALTY * self.infeasible_routes as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolutionEvaluation {
    pub routes: Vec<RouteEvaluation>,
    pub metrics: SolutionMetrics,
}

pub fn evaluate_solution(problem: &RoutingProblem, solution: &CandidateSolution) -> SolutionEvaluation {
    let routes: Vec<RouteEvaluation> = solution
        .routes()
        .iter()
        .enumerate()
        .map(|(index, stops)| evaluate_route(problem, VehicleIdx::new(index), stops))
        .collect();

    let mut metrics = SolutionMetrics {
        assigned: solution.num_assigned(),
        unassigned: solution.unassigned().len() + problem.pre_unassigned().len(),
        ..SolutionMetrics::default()
    };

    let mut used = 0;
    for (route, stops) in routes.iter().zip(solution.routes()) {
        if stops.is_empty() {
            continue;
        }

        used += 1;
        metrics.distance_km += route.distance_km;
        metrics.duration += route.duration;
        metrics.cost += route.cost;
        metrics.co2_kg += route.co2_kg;
        metrics.fuel_liters += route.fuel_liters;
        metrics.utilization += route.utilization;
        if !route.is_feasible() {
            metrics.infeasible_routes += 1;
        }
    }

    if used > 0 {
        metrics.utilization /= used as f64;
    }

    SolutionEvaluation { routes, metrics }
}

#[cfg(test)]
mod tests {
    use crate::test_utils;

    use super::*;

    #[test]
    fn test_empty_route_is_free() {
        let problem = test_utils::create_problem(&[10.0], &[100.0]);
        let evaluation = evaluate_route(&problem, VehicleIdx::new(0), &[]);

        assert_eq!(evaluation, RouteEvaluation::EMPTY);
    }

    #[test]
    fn test_route_metrics() {
        let problem = test_utils::create_problem(&[50.0, 25.0], &[100.0]);
        let stops = [LocationIdx::new(1), LocationIdx::new(2)];
        let evaluation = evaluate_route(&problem, VehicleIdx::new(0), &stops);

        assert!(evaluation.is_feasible());
        assert_eq!(evaluation.load.weight, 75.0);
        assert_eq!(evaluation.utilization, 0.75);
        assert!(evaluation.distance_km > 0.0);
        assert!(evaluation.cost > 0.0);
        assert!(evaluation.duration >= problem.config().itinerary.loading_duration);
    }

    #[test]
    fn test_unassigned_penalty_dominates() {
        let problem = test_utils::create_problem(&[50.0, 25.0], &[100.0]);
        let weights = problem.config().objective_weights;

        let full = CandidateSolution::from_routes(
            &problem,
            vec![vec![LocationIdx::new(1), LocationIdx::new(2)]],
        );
        let partial = CandidateSolution::from_routes(&problem, vec![vec![LocationIdx::new(1)]]);

        let full_cost = full.evaluate(&problem).metrics.search_cost(&weights);
        let partial_cost = partial.evaluate(&problem).metrics.search_cost(&weights);
        assert!(full_cost < partial_cost);
    }
}
