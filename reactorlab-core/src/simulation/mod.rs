pub mod builder;
pub mod engine;
pub mod profile;
pub mod state;
