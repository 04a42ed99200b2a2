use std::fmt::Display;

use jiff::{SignedDuration, Timestamp};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::cancellation::CancellationToken;

#[derive(Clone, Debug)]
pub enum Termination {
    Duration(SignedDuration),
    UnimprovedDuration(SignedDuration),
    Iterations(usize),
}

/// Why a search stopped.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The algorithm reached its own stopping criterion (temperature floor,
    /// generations or iterations done).
    Converged,
    IterationLimit,
    TimeBudget,
    Unimproved,
    Cancelled,
}

impl StopReason {
    /// Stopped early by a budget or a cancellation rather than by the
    /// algorithm itself.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            StopReason::TimeBudget | StopReason::Unimproved | StopReason::Cancelled
        )
    }
}

impl Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Converged => write!(f, "converged"),
            StopReason::IterationLimit => write!(f, "iteration limit"),
            StopReason::TimeBudget => write!(f, "time budget"),
            StopReason::Unimproved => write!(f, "no improvement"),
            StopReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Wall clock budgets of one search run plus the shared cancellation flag.
#[derive(Clone, Debug)]
pub struct SearchBudget {
    solve_started_at: Timestamp,
    last_improvement_at: Timestamp,
    terminations: Vec<Termination>,
    cancellation: CancellationToken,
    iteration: usize,
}

impl SearchBudget {
    pub fn new(
        solve_started_at: Timestamp,
        terminations: Vec<Termination>,
        cancellation: CancellationToken,
    ) -> Self {
        SearchBudget {
            solve_started_at,
            last_improvement_at: Timestamp::now(),
            terminations,
            cancellation,
            iteration: 0,
        }
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn next_iteration(&mut self) {
        self.iteration += 1;
    }

    pub fn record_improvement(&mut self) {
        self.last_improvement_at = Timestamp::now();
    }

    fn check_termination(&self, termination: &Termination, now: Timestamp) -> Option<StopReason> {
        match *termination {
            Termination::Duration(max_duration) => {
                (now.duration_since(self.solve_started_at) >= max_duration)
                    .then_some(StopReason::TimeBudget)
            }
            Termination::UnimprovedDuration(max_duration) => {
                (now.duration_since(self.last_improvement_at) >= max_duration)
                    .then_some(StopReason::Unimproved)
            }
            Termination::Iterations(max_iterations) => {
                (self.iteration >= max_iterations).then_some(StopReason::IterationLimit)
            }
        }
    }

    /// First budget exceeded, if any. Cancellation wins over every other reason.
    pub fn should_stop(&self) -> Option<StopReason> {
        if self.cancellation.is_cancelled() {
            return Some(StopReason::Cancelled);
        }

        let now = Timestamp::now();
        let reason = self
            .terminations
            .iter()
            .find_map(|termination| self.check_termination(termination, now));

        if let Some(reason) = reason {
            debug!(iteration = self.iteration, %reason, "Termination condition met");
        }

        reason
    }
}
