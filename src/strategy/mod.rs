// Trading strategy module
pub mod analyzer;

pub use analyzer::{AnalyzerConfig, MarketAnalyzer};

use crate::execution::PriceHistoryBuffer;
use crate::models::AnalysisResult;

/// Base trait for all trading strategies
pub trait Strategy: Send + Sync {
    /// Analyze the price history and produce a signal
    ///
    /// Never fails: missing data is reported as a WAIT result.
    fn analyze(&self, history: &PriceHistoryBuffer) -> AnalysisResult;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Minimum samples required before a non-WAIT signal is possible
    fn min_samples_required(&self) -> usize;
}
