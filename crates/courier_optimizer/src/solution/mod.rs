pub mod candidate_solution;
pub mod insertion;
pub mod route_evaluation;
