pub mod confidence;
pub mod itinerary_builder;
pub mod route;
pub mod waypoint;
