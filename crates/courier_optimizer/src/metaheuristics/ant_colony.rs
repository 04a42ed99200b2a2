use rand::{Rng, SeedableRng, rngs::SmallRng, seq::IndexedRandom};
use rayon::prelude::*;
use tracing::debug;

use crate::{
    config::{Algorithm, AntColonyParams},
    constraints::route_cursor::RouteCursor,
    cost::cost_model::DISTANCE_EPSILON_KM,
    problem::{location::LocationIdx, routing_problem::RoutingProblem, vehicle::VehicleIdx},
    solution::{candidate_solution::CandidateSolution, insertion::repair},
};

use super::{
    search_budget::StopReason,
    search_context::{SearchContext, SearchOutcome},
};

const MIN_PHEROMONE: f64 = 1e-6;

/// Flat `n * n` pheromone trails between locations.
#[derive(Debug, Clone)]
pub struct PheromoneMatrix {
    trails: Vec<f64>,
    num_locations: usize,
}

impl PheromoneMatrix {
    pub fn new(num_locations: usize, initial: f64) -> Self {
        PheromoneMatrix {
            trails: vec![initial; num_locations * num_locations],
            num_locations,
        }
    }

    pub fn get(&self, from: LocationIdx, to: LocationIdx) -> f64 {
        self.trails[from.get() * self.num_locations + to.get()]
    }

    pub fn evaporate(&mut self, rate: f64) {
        for trail in &mut self.trails {
            *trail = (*trail * (1.0 - rate)).max(MIN_PHEROMONE);
        }
    }

    pub fn deposit(&mut self, from: LocationIdx, to: LocationIdx, amount: f64) {
        self.trails[from.get() * self.num_locations + to.get()] += amount;
    }
}

/// Every edge driven by the solution, including the legs out of the start
/// and into the closing location.
fn solution_edges(problem: &RoutingProblem, solution: &CandidateSolution) -> Vec<(LocationIdx, LocationIdx)> {
    let mut edges = vec![];
    for (vehicle_id, route) in solution.non_empty_routes() {
        let mut previous = problem.vehicle_start(vehicle_id);
        for &stop in route {
            edges.push((previous, stop));
            previous = stop;
        }

        if let Some(end) = problem.vehicle_end(vehicle_id) {
            edges.push((previous, end));
        }
    }

    edges
}

/// One ant walk: vehicles are filled one after the other, each next stop
/// drawn proportionally to `pheromone^alpha * (1 / distance)^beta` among
/// the stops the route can still take.
pub fn construct_solution<R: Rng>(
    problem: &RoutingProblem,
    pheromones: &PheromoneMatrix,
    params: &AntColonyParams,
    rng: &mut R,
) -> CandidateSolution {
    let mut remaining: Vec<LocationIdx> = problem.routable_stops().to_vec();
    let mut routes = Vec::with_capacity(problem.num_vehicles());

    for vehicle_id in VehicleIdx::range(problem.num_vehicles()) {
        let mut cursor = RouteCursor::start(problem, vehicle_id);
        let mut route = vec![];

        loop {
            let position = cursor.position();
            let candidates: Vec<(LocationIdx, f64)> = remaining
                .iter()
                .filter(|&&stop| cursor.can_append(stop))
                .map(|&stop| {
                    let distance = problem.distance(position, stop).max(DISTANCE_EPSILON_KM);
                    let weight = pheromones.get(position, stop).powf(params.alpha)
                        * (1.0 / distance).powf(params.beta);
                    (stop, weight)
                })
                .collect();

            if candidates.is_empty() {
                break;
            }

            let next = match candidates.choose_weighted(rng, |candidate| candidate.1) {
                Ok(&(stop, _)) => stop,
                // Weights underflowed, fall back to the closest stop
                Err(_) => candidates
                    .iter()
                    .map(|&(stop, _)| stop)
                    .min_by(|&a, &b| {
                        problem
                            .distance(position, a)
                            .total_cmp(&problem.distance(position, b))
                    })
                    .unwrap_or(candidates[0].0),
            };

            cursor.push_stop(next);
            route.push(next);
            remaining.retain(|&stop| stop != next);
        }

        routes.push(route);
        if remaining.is_empty() {
            break;
        }
    }

    let mut solution = CandidateSolution::from_routes(problem, routes);
    if !solution.unassigned().is_empty() {
        repair(problem, &mut solution);
    }

    solution
}

/// Ant colony optimization. Only the best ant of each iteration lays
/// pheromone, proportionally to how it compares to the first iteration.
pub fn ant_colony(context: &SearchContext) -> SearchOutcome {
    let problem = context.problem;
    let params = problem.config().ant_colony;
    let mut rng = context.rng(Algorithm::AntColony);
    let mut budget = context.budget(params.iterations);

    let mut pheromones = PheromoneMatrix::new(problem.locations().len(), params.initial_pheromone);
    let mut best: Option<(CandidateSolution, f64)> = None;
    let mut reference_cost: Option<f64> = None;
    let mut history = vec![];

    let stop_reason = loop {
        if let Some(reason) = budget.should_stop() {
            break match reason {
                StopReason::IterationLimit => StopReason::Converged,
                reason => reason,
            };
        }

        budget.next_iteration();

        let seeds: Vec<u64> = (0..params.ants).map(|_| rng.random()).collect();
        let ants: Vec<(CandidateSolution, f64)> = seeds
            .into_par_iter()
            .map(|seed| {
                let mut ant_rng = SmallRng::seed_from_u64(seed);
                let solution = construct_solution(problem, &pheromones, &params, &mut ant_rng);
                let cost = context.search_cost(&solution);
                (solution, cost)
            })
            .collect();

        let Some((iteration_best, iteration_cost)) = ants
            .into_iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
        else {
            break StopReason::Converged;
        };

        let reference = *reference_cost.get_or_insert(iteration_cost.abs().max(1.0));

        pheromones.evaporate(params.evaporation_rate);
        let amount = params.deposit_factor * reference / iteration_cost.abs().max(1.0);
        for (from, to) in solution_edges(problem, &iteration_best) {
            pheromones.deposit(from, to, amount);
        }

        if best.as_ref().is_none_or(|(_, cost)| iteration_cost < *cost) {
            best = Some((iteration_best, iteration_cost));
            budget.record_improvement();
        }

        if let Some((_, best_cost)) = &best {
            history.push(*best_cost);
            context.report(Algorithm::AntColony, budget.iteration(), *best_cost);
        }
    };

    let (solution, best_cost) = best.unwrap_or_else(|| {
        let solution = construct_solution(problem, &pheromones, &params, &mut rng);
        let cost = context.search_cost(&solution);
        (solution, cost)
    });

    debug!(
        iterations = budget.iteration(),
        best_cost,
        %stop_reason,
        "Ant colony finished"
    );

    SearchOutcome {
        algorithm: Algorithm::AntColony,
        solution,
        best_cost,
        iterations: budget.iteration(),
        stop_reason,
        history,
    }
}
