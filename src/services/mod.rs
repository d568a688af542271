pub mod assistant;
pub mod stats;
pub mod streak;
