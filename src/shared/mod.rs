pub mod names;
pub mod score;
