use super::Strategy;
use crate::execution::PriceHistoryBuffer;
use crate::indicators::{calculate_momentum, calculate_volatility};
use crate::models::{AnalysisResult, Indicators, Signal};

/// Configuration for signal generation
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub fast_ma_period: usize,
    pub mid_ma_period: usize,
    pub slow_ma_period: usize,
    /// Samples required before analysis runs at all
    pub min_history: usize,
    /// Momentum compares against the sample this many positions from the end
    pub momentum_lookback: usize,
    pub volatility_window: usize,
    /// Below this range (% of price) every signal is downgraded to WAIT
    pub min_volatility_pct: f64,
    pub strong_base_confidence: f64,
    pub strong_max_confidence: f64,
    pub strong_momentum_weight: f64,
    pub moderate_base_confidence: f64,
    pub moderate_max_confidence: f64,
    pub moderate_momentum_weight: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fast_ma_period: 5,
            mid_ma_period: 10,
            slow_ma_period: 20,
            min_history: 20,
            momentum_lookback: 6,
            volatility_window: 10,
            min_volatility_pct: 0.05,
            strong_base_confidence: 60.0,
            strong_max_confidence: 90.0,
            strong_momentum_weight: 10.0,
            moderate_base_confidence: 50.0,
            moderate_max_confidence: 75.0,
            moderate_momentum_weight: 5.0,
        }
    }
}

/// Moving-average trend strategy with momentum confirmation
///
/// Reads the MA5/MA10/MA20 stack for trend direction, requires momentum
/// in the same direction, and stands aside in dead-quiet markets.
#[derive(Debug, Clone, Default)]
pub struct MarketAnalyzer {
    config: AnalyzerConfig,
}

impl MarketAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    fn compute_indicators(&self, history: &PriceHistoryBuffer) -> Option<Indicators> {
        let prices = history.values();
        let current_price = history.latest()?;
        let (momentum, momentum_percent) =
            calculate_momentum(&prices, self.config.momentum_lookback)?;
        let (volatility, volatility_percent) =
            calculate_volatility(&prices, self.config.volatility_window)?;

        Some(Indicators {
            current_price,
            ma5: history.moving_average(self.config.fast_ma_period),
            ma10: history.moving_average(self.config.mid_ma_period),
            ma20: history.moving_average(self.config.slow_ma_period),
            momentum,
            momentum_percent,
            volatility,
            volatility_percent,
        })
    }

    /// Apply the trend rules in priority order, first match wins
    fn classify(&self, ind: &Indicators) -> (Signal, &'static str, f64) {
        let cfg = &self.config;
        let price = ind.current_price;
        let momentum_pct = ind.momentum_percent.abs();
        let strong = cfg
            .strong_max_confidence
            .min(cfg.strong_base_confidence + momentum_pct * cfg.strong_momentum_weight);
        let moderate = cfg
            .moderate_max_confidence
            .min(cfg.moderate_base_confidence + momentum_pct * cfg.moderate_momentum_weight);

        if ind.ma5 > ind.ma10 && ind.ma10 > ind.ma20 && ind.momentum > 0.0 && price > ind.ma5 {
            (Signal::Long, "strong uptrend + positive momentum", strong)
        } else if ind.ma5 < ind.ma10 && ind.ma10 < ind.ma20 && ind.momentum < 0.0 && price < ind.ma5
        {
            (Signal::Short, "strong downtrend + negative momentum", strong)
        } else if ind.ma5 > ind.ma10 && price > ind.ma10 && ind.momentum > 0.0 {
            (Signal::Long, "moderate uptrend", moderate)
        } else if ind.ma5 < ind.ma10 && price < ind.ma10 && ind.momentum < 0.0 {
            (Signal::Short, "moderate downtrend", moderate)
        } else {
            (Signal::Wait, "no clear trend", 0.0)
        }
    }
}

impl Strategy for MarketAnalyzer {
    fn analyze(&self, history: &PriceHistoryBuffer) -> AnalysisResult {
        if history.len() < self.min_samples_required() {
            return AnalysisResult::wait("insufficient history");
        }

        let Some(indicators) = self.compute_indicators(history) else {
            return AnalysisResult::wait("insufficient history");
        };

        let (mut signal, mut reason, mut confidence) = self.classify(&indicators);

        // Quiet market: applied last, overrides any trend signal
        if indicators.volatility_percent < self.config.min_volatility_pct && signal != Signal::Wait
        {
            signal = Signal::Wait;
            reason = "volatility too low";
            confidence = 0.0;
        }

        tracing::debug!(
            signal = %signal,
            confidence = confidence,
            ma5 = indicators.ma5,
            ma10 = indicators.ma10,
            ma20 = indicators.ma20,
            momentum_pct = indicators.momentum_percent,
            volatility_pct = indicators.volatility_percent,
            "Market analyzed"
        );

        AnalysisResult {
            signal,
            reason: reason.to_string(),
            confidence,
            indicators: Some(indicators),
        }
    }

    fn name(&self) -> &str {
        "MarketAnalyzer"
    }

    fn min_samples_required(&self) -> usize {
        // Momentum needs its lookback even if min_history is configured lower
        self.config
            .min_history
            .max(self.config.momentum_lookback)
            .max(1)
    }
}
