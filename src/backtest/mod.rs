pub mod runner;
pub mod synthetic;

pub use runner::{BacktestResult, BacktestRunner};
pub use synthetic::{MarketScenario, SyntheticPriceGenerator};
