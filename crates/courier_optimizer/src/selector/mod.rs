pub mod multi_objective_selector;
