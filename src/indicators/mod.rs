// Technical indicators module
// Moving averages, momentum and range volatility over raw price series

pub mod market_analysis;
pub mod moving_average;

pub use market_analysis::{calculate_momentum, calculate_volatility};
pub use moving_average::calculate_sma;
