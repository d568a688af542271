pub mod assistant;
pub mod auth;
pub mod categories;
pub mod entries;
pub mod export;
pub mod health;
pub mod stats;
pub mod templates;
