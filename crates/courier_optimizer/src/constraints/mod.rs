pub mod route_cursor;
pub mod route_validator;
