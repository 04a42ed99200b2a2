use jiff::SignedDuration;
use schemars::JsonSchema;
use serde::Serialize;

use crate::{
    config::Algorithm,
    itinerary::{confidence::result_confidence, route::Route},
    problem::{routing_problem::RoutingProblem, unassigned::UnassignedReason},
    selector::multi_objective_selector::{Candidate, CandidateScore},
};

#[derive(Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedLocation {
    pub location_id: String,
    pub reason: UnassignedReason,
}

#[derive(Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub total_distance_km: f64,
    pub total_duration: SignedDuration,
    pub total_cost: f64,
    pub total_co2_kg: f64,
    pub total_fuel_liters: f64,
    pub vehicles_used: usize,
    pub assigned_stops: usize,
    pub unassigned_stops: usize,
    /// Share of the requested stops that were routed, in percent.
    pub fulfillment: f64,
    pub violations: usize,
    /// Algorithm whose candidate won the selection.
    pub algorithm: Algorithm,
    pub candidates: Vec<CandidateScore>,
    /// A solver stopped on its time budget, its no-improvement budget or a
    /// cancellation.
    pub degraded: bool,
    pub solve_duration: SignedDuration,
    pub baseline_distance_km: f64,
    pub baseline_cost: f64,
    pub distance_savings_km: f64,
    pub cost_savings: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub routes: Vec<Route>,
    pub unassigned: Vec<UnassignedLocation>,
    pub summary: ResultSummary,
    pub confidence: f64,
    /// Route warnings and violations, prefixed with the vehicle id.
    pub warnings: Vec<String>,
}

impl OptimizationResult {
    pub fn new(
        problem: &RoutingProblem,
        winner: &Candidate,
        routes: Vec<Route>,
        candidates: Vec<CandidateScore>,
        degraded: bool,
        solve_duration: SignedDuration,
    ) -> Self {
        let mut unassigned: Vec<UnassignedLocation> = problem
            .pre_unassigned()
            .iter()
            .map(|stop| UnassignedLocation {
                location_id: problem.location(stop.location_id).external_id().to_owned(),
                reason: stop.reason,
            })
            .collect();
        unassigned.extend(winner.solution.unassigned().iter().map(|&stop| {
            UnassignedLocation {
                location_id: problem.location(stop).external_id().to_owned(),
                reason: UnassignedReason::NotRouted,
            }
        }));

        let assigned_stops: usize = routes.iter().map(|route| route.destinations().count()).sum();
        let fulfillment = match problem.num_stops() {
            0 => 100.0,
            total => assigned_stops as f64 / total as f64 * 100.0,
        };

        let mut warnings = vec![];
        if degraded {
            warnings.push(String::from(
                "solver stopped before converging, the result may be improvable",
            ));
        }
        for route in &routes {
            for violation in &route.violations {
                warnings.push(format!("{}: {}", route.vehicle_id, violation.detail));
            }
            for warning in &route.warnings {
                warnings.push(format!("{}: {}", route.vehicle_id, warning.message));
            }
        }

        let route_confidences: Vec<f64> = routes.iter().map(|route| route.confidence).collect();

        let summary = ResultSummary {
            total_distance_km: routes.iter().map(|route| route.metrics.distance_km).sum(),
            total_duration: routes
                .iter()
                .fold(SignedDuration::ZERO, |total, route| total + route.metrics.duration),
            total_cost: routes.iter().map(|route| route.metrics.cost).sum(),
            total_co2_kg: routes.iter().map(|route| route.metrics.co2_kg).sum(),
            total_fuel_liters: routes.iter().map(|route| route.metrics.fuel_liters).sum(),
            vehicles_used: routes.len(),
            assigned_stops,
            unassigned_stops: unassigned.len(),
            fulfillment,
            violations: routes.iter().map(|route| route.violations.len()).sum(),
            algorithm: winner.algorithm,
            candidates,
            degraded,
            solve_duration,
            baseline_distance_km: routes
                .iter()
                .map(|route| route.savings.baseline_distance_km)
                .sum(),
            baseline_cost: routes.iter().map(|route| route.savings.baseline_cost).sum(),
            distance_savings_km: routes.iter().map(|route| route.savings.distance_km).sum(),
            cost_savings: routes.iter().map(|route| route.savings.cost).sum(),
        };

        OptimizationResult {
            routes,
            unassigned,
            summary,
            confidence: result_confidence(&route_confidences, degraded),
            warnings,
        }
    }
}
