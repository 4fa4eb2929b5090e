// Core modules
pub mod api;
pub mod backtest;
pub mod config;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod report;
pub mod strategy;

// Re-export commonly used types
pub use api::FeedError;
pub use models::*;
pub use strategy::Strategy;
