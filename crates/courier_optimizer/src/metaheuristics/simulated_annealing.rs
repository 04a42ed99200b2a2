use rand::Rng;
use tracing::debug;

use crate::{config::Algorithm, solution::candidate_solution::CandidateSolution};

use super::{
    local_moves::random_neighbor,
    search_budget::StopReason,
    search_context::{SearchContext, SearchOutcome},
};

/// Fraction of the initial cost used as starting temperature when none is
/// configured.
const AUTO_TEMPERATURE_RATIO: f64 = 0.05;

/// Simulated annealing over random local moves with Metropolis acceptance
/// and geometric cooling.
pub fn simulated_annealing(
    context: &SearchContext,
    initial: CandidateSolution,
) -> SearchOutcome {
    let problem = context.problem;
    let params = problem.config().simulated_annealing;
    let mut rng = context.rng(Algorithm::SimulatedAnnealing);
    let mut budget = context.budget(params.max_iterations);

    let mut current_cost = context.search_cost(&initial);
    let mut current = initial;
    let mut best = current.clone();
    let mut best_cost = current_cost;
    let mut history = vec![best_cost];

    let mut temperature = params
        .initial_temperature
        .unwrap_or(current_cost.abs() * AUTO_TEMPERATURE_RATIO)
        .max(params.min_temperature * 10.0);

    let mut accepted = 0;
    let stop_reason = loop {
        if temperature < params.min_temperature {
            break StopReason::Converged;
        }

        if let Some(reason) = budget.should_stop() {
            break reason;
        }

        budget.next_iteration();

        if let Some(neighbor) = random_neighbor(problem, &current, &mut rng) {
            let neighbor_cost = context.search_cost(&neighbor);
            let delta = neighbor_cost - current_cost;

            let accept = delta < 0.0 || rng.random::<f64>() < (-delta / temperature).exp();
            if accept {
                current = neighbor;
                current_cost = neighbor_cost;
                accepted += 1;

                if current_cost < best_cost {
                    best = current.clone();
                    best_cost = current_cost;
                    budget.record_improvement();
                }
            }
        }

        temperature *= params.cooling_rate;
        history.push(best_cost);
        context.report(Algorithm::SimulatedAnnealing, budget.iteration(), best_cost);
    };

    debug!(
        iterations = budget.iteration(),
        accepted,
        best_cost,
        %stop_reason,
        "Simulated annealing finished"
    );

    SearchOutcome {
        algorithm: Algorithm::SimulatedAnnealing,
        solution: best,
        best_cost,
        iterations: budget.iteration(),
        stop_reason,
        history,
    }
}
