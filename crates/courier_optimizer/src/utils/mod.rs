pub mod cancellation;
pub mod newtype_index;
pub mod normalize;
pub mod time;
