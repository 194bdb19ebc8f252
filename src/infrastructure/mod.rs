pub mod backends;
pub mod recorders;
