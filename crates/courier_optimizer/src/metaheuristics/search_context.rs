use jiff::{SignedDuration, Timestamp};
use rand::{SeedableRng, rngs::SmallRng};
use schemars::JsonSchema;
use serde::Serialize;
use tokio::sync::watch;

use crate::{
    config::Algorithm,
    problem::routing_problem::RoutingProblem,
    solution::candidate_solution::CandidateSolution,
    utils::cancellation::CancellationToken,
};

use super::search_budget::{SearchBudget, StopReason, Termination};

/// Snapshot published while solving.
#[derive(Serialize, Debug, Clone, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SolverProgress {
    pub algorithm: Option<Algorithm>,
    pub iteration: usize,
    pub best_cost: Option<f64>,
    pub elapsed: SignedDuration,
}

/// Best solution of a search run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub algorithm: Algorithm,
    pub solution: CandidateSolution,
    pub best_cost: f64,
    pub iterations: usize,
    pub stop_reason: StopReason,
    /// Best cost after each iteration, non-increasing.
    pub history: Vec<f64>,
}

/// Everything a search run reads besides its parameters: the problem, the
/// shared cancellation flag and the progress channel.
#[derive(Clone)]
pub struct SearchContext<'a> {
    pub problem: &'a RoutingProblem,
    pub cancellation: CancellationToken,
    pub progress: Option<&'a watch::Sender<SolverProgress>>,
    pub started_at: Timestamp,
}

/// Iterations between two progress snapshots.
const PROGRESS_INTERVAL: usize = 50;

impl<'a> SearchContext<'a> {
    pub fn new(problem: &'a RoutingProblem) -> Self {
        SearchContext {
            problem,
            cancellation: CancellationToken::new(),
            progress: None,
            started_at: Timestamp::now(),
        }
    }

    /// Independent generator per algorithm, derived from the request seed.
    pub fn rng(&self, algorithm: Algorithm) -> SmallRng {
        let salt: u64 = match algorithm {
            Algorithm::NearestNeighbor => 0x4e4e,
            Algorithm::Savings => 0x4357,
            Algorithm::SimulatedAnnealing => 0x5341,
            Algorithm::Genetic => 0x4741,
            Algorithm::AntColony => 0x4143_4f,
            Algorithm::Hybrid => 0x4859,
        };

        SmallRng::seed_from_u64(self.problem.config().seed ^ salt)
    }

    pub fn budget(&self, max_iterations: usize) -> SearchBudget {
        let config = self.problem.config();

        SearchBudget::new(
            self.started_at,
            vec![
                Termination::Iterations(max_iterations),
                Termination::Duration(config.max_solver_duration),
                Termination::UnimprovedDuration(config.max_unimproved_duration),
            ],
            self.cancellation.clone(),
        )
    }

    pub fn report(&self, algorithm: Algorithm, iteration: usize, best_cost: f64) {
        if let Some(progress) = self.progress
            && iteration % PROGRESS_INTERVAL == 0
        {
            progress.send_replace(SolverProgress {
                algorithm: Some(algorithm),
                iteration,
                best_cost: Some(best_cost),
                elapsed: Timestamp::now().duration_since(self.started_at),
            });
        }
    }

    pub fn search_cost(&self, solution: &CandidateSolution) -> f64 {
        solution
            .evaluate(self.problem)
            .metrics
            .search_cost(&self.problem.config().objective_weights)
    }
}
