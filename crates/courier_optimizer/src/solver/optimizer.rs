use jiff::Timestamp;
use parking_lot::RwLock;
use schemars::JsonSchema;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::{
    config::OptimizationConfig,
    error::OptimizeError,
    itinerary::itinerary_builder::ItineraryBuilder,
    metaheuristics::search_context::{SearchContext, SolverProgress},
    problem::{location::Location, routing_problem::RoutingProblem, vehicle::Vehicle},
    result::OptimizationResult,
    selector::multi_objective_selector::MultiObjectiveSelector,
    timer_debug,
    utils::cancellation::CancellationToken,
};

use super::candidates::run_candidates;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub enum SolverStatus {
    Pending,
    Running,
    Completed,
}

/// One optimization request. Progress can be observed with [`subscribe`]
/// and the solve stopped early with the [`cancellation_token`] while
/// [`run`] executes on another thread.
///
/// [`subscribe`]: Optimizer::subscribe
/// [`cancellation_token`]: Optimizer::cancellation_token
/// [`run`]: Optimizer::run
pub struct Optimizer {
    problem: RoutingProblem,
    status: RwLock<SolverStatus>,
    progress: watch::Sender<SolverProgress>,
    cancellation: CancellationToken,
    created_at: Timestamp,
}

impl Optimizer {
    pub fn new(
        vehicles: Vec<Vehicle>,
        locations: Vec<Location>,
        config: OptimizationConfig,
    ) -> Result<Self, OptimizeError> {
        let problem = RoutingProblem::new(vehicles, locations, config)?;
        Ok(Optimizer::from_problem(problem))
    }

    pub fn from_problem(problem: RoutingProblem) -> Self {
        let (progress, _) = watch::channel(SolverProgress::default());

        Optimizer {
            problem,
            status: RwLock::new(SolverStatus::Pending),
            progress,
            cancellation: CancellationToken::new(),
            created_at: Timestamp::now(),
        }
    }

    pub fn problem(&self) -> &RoutingProblem {
        &self.problem
    }

    pub fn subscribe(&self) -> watch::Receiver<SolverProgress> {
        self.progress.subscribe()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn status(&self) -> SolverStatus {
        *self.status.read()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    #[instrument(skip_all, fields(algorithm = %self.problem.config().algorithm))]
    pub fn run(&self) -> Result<OptimizationResult, OptimizeError> {
        *self.status.write() = SolverStatus::Running;
        let result = self.solve();
        *self.status.write() = SolverStatus::Completed;

        result
    }

    fn solve(&self) -> Result<OptimizationResult, OptimizeError> {
        let problem = &self.problem;
        let started_at = Timestamp::now();
        let context = SearchContext {
            problem,
            cancellation: self.cancellation.clone(),
            progress: Some(&self.progress),
            started_at,
        };

        let candidates = timer_debug!("Solvers", run_candidates(&context));
        let selector = MultiObjectiveSelector::new(&problem.config().objective_weights);
        let (winner, scores) = selector
            .select(&candidates)
            .ok_or(OptimizeError::NoCandidate)?;
        let winner = &candidates[winner];

        let degraded = candidates
            .iter()
            .any(|candidate| candidate.stop_reason.is_degraded());
        if degraded {
            warn!("At least one solver stopped early, returning the best known solution");
        }

        let routes = timer_debug!(
            "Itinerary",
            ItineraryBuilder::new(problem).build_routes(&winner.solution)
        );

        let result = OptimizationResult::new(
            problem,
            winner,
            routes,
            scores,
            degraded,
            Timestamp::now().duration_since(started_at),
        );

        info!(
            winner = %result.summary.algorithm,
            routes = result.routes.len(),
            fulfillment = result.summary.fulfillment,
            total_cost = result.summary.total_cost,
            confidence = result.confidence,
            "Optimization finished"
        );

        Ok(result)
    }
}

/// Validates the request, runs the configured algorithm and expands the
/// selected solution into timed routes.
pub fn optimize(
    vehicles: Vec<Vehicle>,
    locations: Vec<Location>,
    config: OptimizationConfig,
) -> Result<OptimizationResult, OptimizeError> {
    Optimizer::new(vehicles, locations, config)?.run()
}
