use fixedbitset::FixedBitSet;
use rand::{Rng, seq::SliceRandom};
use rayon::prelude::*;
use tracing::debug;

use crate::{
    config::Algorithm,
    constraints::route_cursor::RouteCursor,
    problem::{location::LocationIdx, routing_problem::RoutingProblem, vehicle::VehicleIdx},
    solution::{candidate_solution::CandidateSolution, insertion::repair},
};

use super::{
    search_budget::StopReason,
    search_context::{SearchContext, SearchOutcome},
};

#[derive(Debug, Clone)]
struct Individual {
    tour: Vec<LocationIdx>,
    solution: CandidateSolution,
    cost: f64,
}

/// Splits a giant tour into vehicle routes: each stop goes to the first
/// opened route that can take it, else opens the next vehicle. Stops that
/// fit nowhere are repaired by cheapest insertion.
pub fn decode_tour(problem: &RoutingProblem, tour: &[LocationIdx]) -> CandidateSolution {
    let num_vehicles = problem.num_vehicles();
    let mut cursors: Vec<RouteCursor> = Vec::with_capacity(num_vehicles);
    let mut routes: Vec<Vec<LocationIdx>> = Vec::with_capacity(num_vehicles);

    for &stop in tour {
        if let Some(index) = cursors.iter().position(|cursor| cursor.can_append(stop)) {
            cursors[index].push_stop(stop);
            routes[index].push(stop);
            continue;
        }

        while cursors.len() < num_vehicles {
            let mut cursor = RouteCursor::start(problem, VehicleIdx::new(cursors.len()));
            let mut route = vec![];
            if cursor.can_append(stop) {
                cursor.push_stop(stop);
                route.push(stop);
                cursors.push(cursor);
                routes.push(route);
                break;
            }

            cursors.push(cursor);
            routes.push(route);
        }
    }

    let mut solution = CandidateSolution::from_routes(problem, routes);
    if !solution.unassigned().is_empty() {
        repair(problem, &mut solution);
    }

    solution
}

/// Order crossover: keeps `first[start..=end]` in place and fills the other
/// positions with the remaining stops in the order they appear in `second`.
pub fn order_crossover<R: Rng>(
    first: &[LocationIdx],
    second: &[LocationIdx],
    num_locations: usize,
    rng: &mut R,
) -> Vec<LocationIdx> {
    let len = first.len();
    if len < 2 {
        return first.to_vec();
    }

    let a = rng.random_range(0..len);
    let b = rng.random_range(0..len);
    let (start, end) = (a.min(b), a.max(b));

    let mut in_segment = FixedBitSet::with_capacity(num_locations);
    for stop in &first[start..=end] {
        in_segment.insert(stop.get());
    }

    let mut fill = second
        .iter()
        .cycle()
        .skip(end + 1)
        .take(len)
        .filter(|stop| !in_segment.contains(stop.get()));

    let mut child = first.to_vec();
    for offset in 1..=(len - (end - start + 1)) {
        let position = (end + offset) % len;
        if let Some(&stop) = fill.next() {
            child[position] = stop;
        }
    }

    child
}

/// Swaps two positions or moves one stop elsewhere, with equal probability.
pub fn mutate<R: Rng>(tour: &mut Vec<LocationIdx>, rng: &mut R) {
    let len = tour.len();
    if len < 2 {
        return;
    }

    let from = rng.random_range(0..len);
    let to = rng.random_range(0..len);
    if rng.random_bool(0.5) {
        tour.swap(from, to);
    } else {
        let stop = tour.remove(from);
        tour.insert(to, stop);
    }
}

fn tournament<'a, R: Rng>(population: &'a [Individual], size: usize, rng: &mut R) -> &'a Individual {
    let mut winner = &population[rng.random_range(0..population.len())];
    for _ in 1..size {
        let challenger = &population[rng.random_range(0..population.len())];
        if challenger.cost < winner.cost {
            winner = challenger;
        }
    }

    winner
}

fn evaluate_tours(context: &SearchContext, tours: Vec<Vec<LocationIdx>>) -> Vec<Individual> {
    tours
        .into_par_iter()
        .map(|tour| {
            let solution = decode_tour(context.problem, &tour);
            let cost = context.search_cost(&solution);

            Individual {
                tour,
                solution,
                cost,
            }
        })
        .collect()
}

fn sort_population(population: &mut [Individual]) {
    population.sort_by(|a, b| a.cost.total_cmp(&b.cost));
}

/// Generational genetic algorithm over giant tours. `seeds` are solutions
/// whose giant tours join the initial population.
pub fn genetic(context: &SearchContext, seeds: &[CandidateSolution]) -> SearchOutcome {
    let problem = context.problem;
    let params = problem.config().genetic;
    let num_locations = problem.locations().len();
    let mut rng = context.rng(Algorithm::Genetic);
    let mut budget = context.budget(params.generations);

    let mut initial_tours: Vec<Vec<LocationIdx>> = seeds
        .iter()
        .take(params.population_size)
        .map(CandidateSolution::giant_tour)
        .collect();
    while initial_tours.len() < params.population_size {
        let mut tour = problem.routable_stops().to_vec();
        tour.shuffle(&mut rng);
        initial_tours.push(tour);
    }

    let mut population = evaluate_tours(context, initial_tours);
    sort_population(&mut population);

    let mut best = population[0].clone();
    let mut history = vec![best.cost];

    let stop_reason = loop {
        if let Some(reason) = budget.should_stop() {
            break match reason {
                StopReason::IterationLimit => StopReason::Converged,
                reason => reason,
            };
        }

        budget.next_iteration();

        let elites = params.elites.min(population.len());
        let mut offspring = Vec::with_capacity(params.population_size - elites);
        while offspring.len() < params.population_size - elites {
            let first = tournament(&population, params.tournament_size, &mut rng);
            let second = tournament(&population, params.tournament_size, &mut rng);

            let mut child = if rng.random_bool(params.crossover_rate.clamp(0.0, 1.0)) {
                order_crossover(&first.tour, &second.tour, num_locations, &mut rng)
            } else {
                first.tour.clone()
            };

            if rng.random_bool(params.mutation_rate.clamp(0.0, 1.0)) {
                mutate(&mut child, &mut rng);
            }

            offspring.push(child);
        }

        let mut next = population[..elites].to_vec();
        next.extend(evaluate_tours(context, offspring));
        sort_population(&mut next);
        population = next;

        if population[0].cost < best.cost {
            best = population[0].clone();
            budget.record_improvement();
        }

        history.push(best.cost);
        context.report(Algorithm::Genetic, budget.iteration(), best.cost);
    };

    debug!(
        generations = budget.iteration(),
        best_cost = best.cost,
        %stop_reason,
        "Genetic algorithm finished"
    );

    SearchOutcome {
        algorithm: Algorithm::Genetic,
        solution: best.solution,
        best_cost: best.cost,
        iterations: budget.iteration(),
        stop_reason,
        history,
    }
}
