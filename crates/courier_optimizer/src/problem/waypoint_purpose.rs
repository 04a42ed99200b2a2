use std::fmt::Display;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::location::LocationRole;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WaypointPurpose {
    Departure,
    Destination,
    Depot,
    Rest,
    Fuel,
    EmptyReturn,
}

impl WaypointPurpose {
    pub fn for_role(role: LocationRole) -> Self {
        match role {
            LocationRole::Depot => WaypointPurpose::Depot,
            LocationRole::Fuel => WaypointPurpose::Fuel,
            LocationRole::Rest => WaypointPurpose::Rest,
            LocationRole::Pickup | LocationRole::Delivery | LocationRole::City => {
                WaypointPurpose::Destination
            }
        }
    }
}

impl Display for WaypointPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaypointPurpose::Departure => write!(f, "departure"),
            WaypointPurpose::Destination => write!(f, "destination"),
            WaypointPurpose::Depot => write!(f, "depot"),
            WaypointPurpose::Rest => write!(f, "rest"),
            WaypointPurpose::Fuel => write!(f, "fuel"),
            WaypointPurpose::EmptyReturn => write!(f, "empty_return"),
        }
    }
}
