pub mod guidelines;
pub mod not_found;
