pub mod chat;
mod component;
mod feedback;

pub use component::GuidelinesGuru;
