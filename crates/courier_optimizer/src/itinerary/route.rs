use jiff::SignedDuration;
use schemars::JsonSchema;
use serde::Serialize;

use crate::{
    constraints::route_validator::{Violation, Warning},
    problem::{demand::Demand, waypoint_purpose::WaypointPurpose},
};

use super::waypoint::Waypoint;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetrics {
    pub distance_km: f64,
    pub duration: SignedDuration,
    pub driving: SignedDuration,
    pub waiting: SignedDuration,
    pub rush_delay: SignedDuration,
    pub fuel_liters: f64,
    pub cost: f64,
    pub co2_kg: f64,
    pub load: Demand,
    pub utilization: f64,
    /// Share of the driving time lost to rush hours, in percent.
    pub rush_hour_impact: f64,
}

/// Comparison with serving the same stops in request order without any
/// inserted waypoint.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteSavings {
    pub baseline_distance_km: f64,
    pub baseline_cost: f64,
    pub distance_km: f64,
    pub cost: f64,
    pub percent: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub vehicle_id: String,
    pub waypoints: Vec<Waypoint>,
    pub metrics: RouteMetrics,
    pub savings: RouteSavings,
    pub feasible: bool,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
    pub confidence: f64,
}

impl Route {
    /// Requested stops served by this route, excluding departure, staging,
    /// rest and closing waypoints.
    pub fn destinations(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints
            .iter()
            .filter(|waypoint| waypoint.purpose == WaypointPurpose::Destination)
    }
}
