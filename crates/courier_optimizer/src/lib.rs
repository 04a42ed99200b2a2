pub mod config;
pub mod constraints;
pub mod construction;
pub mod cost;
pub mod error;
pub mod itinerary;
pub mod json;
pub mod metaheuristics;
pub mod problem;
pub mod result;
pub mod selector;
pub mod solution;
pub mod solver;
mod utils;

pub use utils::cancellation::CancellationToken;

#[cfg(test)]
pub(crate) mod test_utils;
