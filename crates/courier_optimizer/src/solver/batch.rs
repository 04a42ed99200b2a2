use std::{cmp::Ordering, fmt::Display};

use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    config::OptimizationConfig,
    error::OptimizeError,
    problem::{location::Location, vehicle::Vehicle},
    result::OptimizationResult,
};

use super::optimizer::optimize;

/// One configuration of a request, e.g. "peak hours" or "cost optimized".
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub vehicles: Vec<Vehicle>,
    pub locations: Vec<Location>,
    pub config: OptimizationConfig,
}

/// Criterion used to pick the best scenario of a batch.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum BatchMetric {
    /// Highest fulfillment, then lowest cost.
    #[default]
    Fulfillment,
    Cost,
    Distance,
    /// Highest confidence, then lowest cost.
    Confidence,
}

impl Display for BatchMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchMetric::Fulfillment => write!(f, "fulfillment"),
            BatchMetric::Cost => write!(f, "cost"),
            BatchMetric::Distance => write!(f, "distance"),
            BatchMetric::Confidence => write!(f, "confidence"),
        }
    }
}

/// Optimizes every scenario independently, in parallel. Results keep the
/// order of `scenarios`.
pub fn batch_optimize(
    scenarios: Vec<Scenario>,
) -> Vec<Result<OptimizationResult, OptimizeError>> {
    scenarios
        .into_par_iter()
        .map(|scenario| {
            let result = optimize(scenario.vehicles, scenario.locations, scenario.config);
            match &result {
                Ok(result) => info!(
                    scenario = %scenario.name,
                    fulfillment = result.summary.fulfillment,
                    total_cost = result.summary.total_cost,
                    "Scenario optimized"
                ),
                Err(error) => info!(scenario = %scenario.name, %error, "Scenario failed"),
            }

            result
        })
        .collect()
}

fn compare(metric: BatchMetric, a: &OptimizationResult, b: &OptimizationResult) -> Ordering {
    let by_cost = b.summary.total_cost.total_cmp(&a.summary.total_cost);

    match metric {
        BatchMetric::Fulfillment => a
            .summary
            .fulfillment
            .total_cmp(&b.summary.fulfillment)
            .then(by_cost),
        BatchMetric::Cost => by_cost,
        BatchMetric::Distance => b
            .summary
            .total_distance_km
            .total_cmp(&a.summary.total_distance_km),
        BatchMetric::Confidence => a.confidence.total_cmp(&b.confidence).then(by_cost),
    }
}

/// Index of the best successful scenario by `metric`. The first one wins
/// ties.
pub fn select_best_scenario(
    results: &[Result<OptimizationResult, OptimizeError>],
    metric: BatchMetric,
) -> Option<usize> {
    results
        .iter()
        .enumerate()
        .filter_map(|(index, result)| result.as_ref().ok().map(|result| (index, result)))
        .reduce(|best, candidate| {
            if compare(metric, candidate.1, best.1) == Ordering::Greater {
                candidate
            } else {
                best
            }
        })
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use crate::{error::ValidationError, test_utils};

    use super::*;

    fn scenario(name: &str, weights: &[f64], capacities: &[f64]) -> Scenario {
        Scenario {
            name: name.to_owned(),
            vehicles: test_utils::create_vehicles(capacities),
            locations: test_utils::create_locations(weights),
            config: test_utils::config(),
        }
    }

    #[test]
    fn test_batch_keeps_order_and_errors() {
        let results = batch_optimize(vec![
            scenario("small fleet", &[60.0, 60.0], &[100.0]),
            scenario("no fleet", &[60.0], &[]),
            scenario("large fleet", &[60.0, 60.0], &[100.0, 100.0]),
        ]);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().summary.fulfillment, 50.0);
        assert_eq!(
            results[1].as_ref().unwrap_err(),
            &OptimizeError::Validation(ValidationError::EmptyFleet)
        );
        assert_eq!(results[2].as_ref().unwrap().summary.fulfillment, 100.0);

        assert_eq!(select_best_scenario(&results, BatchMetric::Fulfillment), Some(2));
        assert_eq!(select_best_scenario(&results, BatchMetric::Cost), Some(0));
        assert_eq!(select_best_scenario(&results, BatchMetric::Distance), Some(0));
    }

    #[test]
    fn test_no_successful_scenario() {
        let results = batch_optimize(vec![scenario("no fleet", &[10.0], &[])]);
        assert_eq!(select_best_scenario(&results, BatchMetric::Confidence), None);
    }
}
