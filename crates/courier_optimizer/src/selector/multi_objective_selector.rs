use std::cmp::Ordering;

use schemars::JsonSchema;
use serde::Serialize;

use crate::{
    config::{Algorithm, ObjectiveWeights},
    metaheuristics::search_budget::StopReason,
    solution::{candidate_solution::CandidateSolution, route_evaluation::SolutionMetrics},
    utils::normalize::normalize_all,
};

/// A solution produced by one algorithm, competing for the final result.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub algorithm: Algorithm,
    pub solution: CandidateSolution,
    pub metrics: SolutionMetrics,
    pub stop_reason: StopReason,
}

#[derive(Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateScore {
    pub algorithm: Algorithm,
    pub assigned: usize,
    /// Weighted normalized score, higher is better. `None` when the candidate
    /// serves fewer stops than the best one and was never scored.
    pub score: Option<f64>,
    pub cost: f64,
    pub distance_km: f64,
    pub stop_reason: StopReason,
}

/// Picks the candidate serving the most stops, then the highest weighted
/// score over min-max normalized objectives.
pub struct MultiObjectiveSelector {
    weights: [f64; 5],
}

impl MultiObjectiveSelector {
    pub fn new(weights: &ObjectiveWeights) -> Self {
        let total = weights.total();
        let weights = if total > 0.0 {
            weights.as_array().map(|weight| weight / total)
        } else {
            [0.0; 5]
        };

        MultiObjectiveSelector { weights }
    }

    /// Scores every candidate, in input order.
    pub fn score(&self, candidates: &[Candidate]) -> Vec<CandidateScore> {
        let max_assigned = candidates
            .iter()
            .map(|candidate| candidate.metrics.assigned)
            .max()
            .unwrap_or(0);

        let eligible: Vec<&Candidate> = candidates
            .iter()
            .filter(|candidate| candidate.metrics.assigned == max_assigned)
            .collect();

        let objective = |extract: fn(&SolutionMetrics) -> f64| {
            normalize_all(
                &eligible
                    .iter()
                    .map(|candidate| extract(&candidate.metrics))
                    .collect::<Vec<_>>(),
            )
        };

        let distance = objective(|metrics| metrics.distance_km);
        let time = objective(SolutionMetrics::hours);
        let cost = objective(|metrics| metrics.cost);
        let utilization = objective(|metrics| metrics.utilization);
        let emissions = objective(|metrics| metrics.co2_kg);

        let [w_distance, w_time, w_cost, w_utilization, w_emissions] = self.weights;

        let mut eligible_index = 0;
        candidates
            .iter()
            .map(|candidate| {
                let score = if candidate.metrics.assigned == max_assigned {
                    let i = eligible_index;
                    eligible_index += 1;

                    Some(
                        -w_distance * distance[i] - w_time * time[i] - w_cost * cost[i]
                            + w_utilization * utilization[i]
                            - w_emissions * emissions[i],
                    )
                } else {
                    None
                };

                CandidateScore {
                    algorithm: candidate.algorithm,
                    assigned: candidate.metrics.assigned,
                    score,
                    cost: candidate.metrics.cost,
                    distance_km: candidate.metrics.distance_km,
                    stop_reason: candidate.stop_reason,
                }
            })
            .collect()
    }

    /// Index of the winning candidate with the scores of all of them. Ties
    /// on score go to the lowest cost, then the shortest distance.
    pub fn select(&self, candidates: &[Candidate]) -> Option<(usize, Vec<CandidateScore>)> {
        let scores = self.score(candidates);

        let winner = scores
            .iter()
            .enumerate()
            .filter_map(|(index, score)| score.score.map(|value| (index, value, score)))
            .max_by(|(_, a_value, a), (_, b_value, b)| {
                a_value
                    .total_cmp(b_value)
                    .then_with(|| b.cost.total_cmp(&a.cost))
                    .then_with(|| b.distance_km.total_cmp(&a.distance_km))
                    // Earlier candidates win complete ties
                    .then(Ordering::Greater)
            })
            .map(|(index, _, _)| index)?;

        Some((winner, scores))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils;

    use super::*;

    fn candidate(algorithm: Algorithm, assigned: usize, distance_km: f64, cost: f64) -> Candidate {
        let problem = test_utils::create_problem(&[10.0], &[100.0]);

        Candidate {
            algorithm,
            solution: CandidateSolution::empty(&problem),
            metrics: SolutionMetrics {
                distance_km,
                cost,
                assigned,
                utilization: 0.5,
                ..SolutionMetrics::default()
            },
            stop_reason: StopReason::Converged,
        }
    }

    #[test]
    fn test_fulfillment_before_score() {
        let selector = MultiObjectiveSelector::new(&ObjectiveWeights::default());
        let candidates = vec![
            candidate(Algorithm::NearestNeighbor, 3, 10.0, 10.0),
            candidate(Algorithm::Savings, 4, 500.0, 900.0),
        ];

        let (winner, scores) = selector.select(&candidates).unwrap();

        assert_eq!(winner, 1);
        assert_eq!(scores[0].score, None);
        assert!(scores[1].score.is_some());
    }

    #[test]
    fn test_lower_objectives_win() {
        let selector = MultiObjectiveSelector::new(&ObjectiveWeights::default());
        let candidates = vec![
            candidate(Algorithm::NearestNeighbor, 4, 120.0, 300.0),
            candidate(Algorithm::SimulatedAnnealing, 4, 100.0, 250.0),
            candidate(Algorithm::Genetic, 4, 110.0, 260.0),
        ];

        let (winner, scores) = selector.select(&candidates).unwrap();

        assert_eq!(winner, 1);
        assert!(scores[1].score > scores[2].score);
        assert!(scores[2].score > scores[0].score);
    }

    #[test]
    fn test_ties_break_on_cost_then_distance() {
        let weights = ObjectiveWeights {
            minimize_distance: 0.0,
            minimize_time: 1.0,
            minimize_cost: 0.0,
            maximize_utilization: 0.0,
            minimize_emissions: 0.0,
        };
        let selector = MultiObjectiveSelector::new(&weights);
        let candidates = vec![
            candidate(Algorithm::NearestNeighbor, 2, 50.0, 80.0),
            candidate(Algorithm::Savings, 2, 40.0, 70.0),
            candidate(Algorithm::Genetic, 2, 30.0, 70.0),
        ];

        let (winner, _) = selector.select(&candidates).unwrap();
        assert_eq!(winner, 2);
    }

    #[test]
    fn test_empty_candidates() {
        let selector = MultiObjectiveSelector::new(&ObjectiveWeights::default());
        assert!(selector.select(&[]).is_none());
    }
}
