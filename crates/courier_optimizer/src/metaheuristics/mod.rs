pub mod ant_colony;
pub mod genetic;
pub mod local_moves;
pub mod search_budget;
pub mod search_context;
pub mod simulated_annealing;
