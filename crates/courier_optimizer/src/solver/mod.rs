pub mod batch;
pub mod candidates;
pub mod optimizer;
