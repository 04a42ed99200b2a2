use thiserror::Error;

/// Structural problems with a request. No solve is attempted when one is found.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("At least one vehicle is required")]
    EmptyFleet,
    #[error("At least one location is required")]
    NoLocations,
    #[error("Vehicle {vehicle_id} has a negative capacity")]
    NegativeCapacity { vehicle_id: String },
    #[error("Location {location_id} has a negative or non-finite demand")]
    NegativeDemand { location_id: String },
    #[error("Location {location_id} has a negative service duration")]
    NegativeServiceDuration { location_id: String },
    #[error("Time window of {owner} starts after it ends")]
    InvalidTimeWindow { owner: String },
    #[error("Location id {0} is used more than once")]
    DuplicateLocationId(String),
    #[error("Vehicle {vehicle_id} references unknown location {location_id}")]
    UnknownLocation {
        vehicle_id: String,
        location_id: String,
    },
    #[error("Vehicle {vehicle_id} has no start location and the request has no depot")]
    MissingDepot { vehicle_id: String },
    #[error("Location {location_id} has invalid coordinates")]
    InvalidCoordinates { location_id: String },
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizeError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error("No candidate solution was produced")]
    NoCandidate,
}
