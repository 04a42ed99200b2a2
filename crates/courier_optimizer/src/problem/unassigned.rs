use std::fmt::Display;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::location::LocationIdx;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedReason {
    /// No vehicle carries the required capabilities or container class.
    NoCompatibleVehicle,
    /// The demand exceeds the capacity of every compatible vehicle.
    CapacityExceeded,
    /// No compatible vehicle can arrive before the time window closes.
    TimeWindowUnreachable,
    /// Serving the stop alone already breaks a vehicle distance, duration or
    /// working hours limit.
    RouteLimitExceeded,
    /// The stop is serviceable on its own but no solver could fit it.
    NotRouted,
}

impl Display for UnassignedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            UnassignedReason::NoCompatibleVehicle => "no compatible vehicle",
            UnassignedReason::CapacityExceeded => "demand exceeds every vehicle capacity",
            UnassignedReason::TimeWindowUnreachable => "time window unreachable",
            UnassignedReason::RouteLimitExceeded => "exceeds vehicle route limits",
            UnassignedReason::NotRouted => "could not be routed",
        };

        write!(f, "{text}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnassignedStop {
    pub location_id: LocationIdx,
    pub reason: UnassignedReason,
}
