pub mod clock_window;
pub mod container;
pub mod demand;
pub mod facility_index;
pub mod kmh;
pub mod location;
pub mod routing_problem;
pub mod time_window;
pub mod travel_matrix;
pub mod vehicle;
pub mod unassigned;
pub mod waypoint_purpose;
