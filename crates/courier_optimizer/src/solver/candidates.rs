use tracing::{debug, info};

use crate::{
    config::Algorithm,
    construction::{clarke_wright::clarke_wright, nearest_neighbor::nearest_neighbor},
    metaheuristics::{
        ant_colony::ant_colony,
        genetic::genetic,
        search_budget::StopReason,
        search_context::{SearchContext, SearchOutcome},
        simulated_annealing::simulated_annealing,
    },
    selector::multi_objective_selector::Candidate,
    solution::candidate_solution::CandidateSolution,
    timer_debug,
};

fn constructed(
    context: &SearchContext,
    algorithm: Algorithm,
    solution: CandidateSolution,
) -> Candidate {
    let metrics = solution.evaluate(context.problem).metrics;
    debug!(%algorithm, cost = metrics.cost, assigned = metrics.assigned, "Constructed solution");

    Candidate {
        algorithm,
        solution,
        metrics,
        stop_reason: StopReason::Converged,
    }
}

fn searched(context: &SearchContext, outcome: SearchOutcome) -> Candidate {
    info!(
        algorithm = %outcome.algorithm,
        iterations = outcome.iterations,
        best_cost = outcome.best_cost,
        stop_reason = %outcome.stop_reason,
        "Search finished"
    );

    Candidate {
        algorithm: outcome.algorithm,
        metrics: outcome.solution.evaluate(context.problem).metrics,
        solution: outcome.solution,
        stop_reason: outcome.stop_reason,
    }
}

/// Runs the configured algorithm and returns every candidate it produced.
/// The nearest neighbor construction is always part of the candidates.
/// `Hybrid` runs both constructions and the three metaheuristics, in
/// parallel where they do not depend on each other.
pub fn run_candidates(context: &SearchContext) -> Vec<Candidate> {
    let problem = context.problem;
    let algorithm = problem.config().algorithm;

    let (nearest, savings) = match algorithm {
        Algorithm::Savings | Algorithm::Hybrid => {
            let (nearest, savings) = rayon::join(
                || timer_debug!("Nearest neighbor", nearest_neighbor(problem)),
                || timer_debug!("Savings", clarke_wright(problem)),
            );
            (nearest, Some(savings))
        }
        _ => (timer_debug!("Nearest neighbor", nearest_neighbor(problem)), None),
    };

    let mut candidates = vec![constructed(context, Algorithm::NearestNeighbor, nearest)];
    if let Some(savings) = savings {
        candidates.push(constructed(context, Algorithm::Savings, savings));
    }

    let best_construction = || {
        candidates
            .iter()
            .min_by(|a, b| {
                context
                    .search_cost(&a.solution)
                    .total_cmp(&context.search_cost(&b.solution))
            })
            .map(|candidate| candidate.solution.clone())
            .unwrap_or_else(|| CandidateSolution::empty(problem))
    };

    let searches = match algorithm {
        Algorithm::NearestNeighbor | Algorithm::Savings => vec![],
        Algorithm::SimulatedAnnealing => {
            let initial = best_construction();
            vec![timer_debug!(
                "Simulated annealing",
                simulated_annealing(context, initial)
            )]
        }
        Algorithm::Genetic => {
            let seeds = [best_construction()];
            vec![timer_debug!("Genetic", genetic(context, &seeds))]
        }
        Algorithm::AntColony => vec![timer_debug!("Ant colony", ant_colony(context))],
        Algorithm::Hybrid => {
            let initial = best_construction();
            let seeds: Vec<CandidateSolution> = candidates
                .iter()
                .map(|candidate| candidate.solution.clone())
                .collect();

            let (annealed, (evolved, colony)) = rayon::join(
                || timer_debug!("Simulated annealing", simulated_annealing(context, initial)),
                || {
                    rayon::join(
                        || timer_debug!("Genetic", genetic(context, &seeds)),
                        || timer_debug!("Ant colony", ant_colony(context)),
                    )
                },
            );

            vec![annealed, evolved, colony]
        }
    };

    candidates.extend(searches.into_iter().map(|outcome| searched(context, outcome)));
    candidates
}

#[cfg(test)]
mod tests {
    use crate::{config::OptimizationConfig, test_utils};

    use super::*;

    fn algorithms(config: OptimizationConfig) -> Vec<Algorithm> {
        let problem = test_utils::problem_from(
            test_utils::create_locations(&[30.0, 20.0, 50.0, 10.0, 40.0]),
            test_utils::create_vehicles(&[100.0, 100.0]),
            config,
        );

        run_candidates(&SearchContext::new(&problem))
            .iter()
            .map(|candidate| candidate.algorithm)
            .collect()
    }

    #[test]
    fn test_single_algorithm_keeps_baseline() {
        let mut config = test_utils::config();
        config.algorithm = Algorithm::SimulatedAnnealing;

        assert_eq!(
            algorithms(config),
            vec![Algorithm::NearestNeighbor, Algorithm::SimulatedAnnealing]
        );
    }

    #[test]
    fn test_hybrid_runs_everything() {
        assert_eq!(
            algorithms(test_utils::config()),
            vec![
                Algorithm::NearestNeighbor,
                Algorithm::Savings,
                Algorithm::SimulatedAnnealing,
                Algorithm::Genetic,
                Algorithm::AntColony,
            ]
        );
    }
}
