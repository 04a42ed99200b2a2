pub mod clarke_wright;
pub mod nearest_neighbor;
pub mod two_opt;
