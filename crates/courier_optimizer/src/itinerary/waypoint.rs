use jiff::{SignedDuration, Timestamp};
use schemars::JsonSchema;
use serde::Serialize;

use crate::problem::{demand::Demand, waypoint_purpose::WaypointPurpose};

/// One timed stop of a final route. Cumulative values are counted from the
/// route departure and include this waypoint.
#[derive(Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub location_id: String,
    pub lat: f64,
    pub lon: f64,
    pub purpose: WaypointPurpose,
    pub arrival: Timestamp,
    pub departure: Timestamp,
    /// Time spent waiting for the time window to open.
    pub waiting: SignedDuration,
    pub distance_from_previous_km: f64,
    pub cumulative_distance_km: f64,
    pub cumulative_duration: SignedDuration,
    pub cumulative_cost: f64,
    pub load: Demand,
}
