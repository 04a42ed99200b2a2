pub mod cost_model;
