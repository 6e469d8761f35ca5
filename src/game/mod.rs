pub mod config;
pub mod constants;
pub mod display;
pub mod events;
pub mod feedback;
pub mod geometry;
pub mod hazards;
pub mod input;
pub mod sanitize;
pub mod scheduler;
pub mod session;
pub mod step;
pub mod types;
