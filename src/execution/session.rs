use chrono::{DateTime, Utc};

use crate::api::FeedError;
use crate::execution::price_feed::{PriceTick, RateSnapshot};
use crate::execution::{
    ExecutionAction, ExecutionDecision, Executor, PositionManager, PriceHistoryBuffer, TradeRecord,
};
use crate::models::AnalysisResult;
use crate::report::{SessionSnapshot, SessionSummary};
use crate::strategy::{MarketAnalyzer, Strategy};

/// Owns every piece of trading state for one run
///
/// The price timer calls [`record_tick`](Self::record_tick) /
/// [`record_price`](Self::record_price); the trade timer calls
/// [`on_trade_tick`](Self::on_trade_tick).
pub struct TradingSession {
    history: PriceHistoryBuffer,
    positions: PositionManager,
    strategy: Box<dyn Strategy>,
    executor: Executor,
    latest_analysis: AnalysisResult,
    current_price: Option<f64>,
    usd_per_ounce: Option<f64>,
    usd_per_gram_24k: Option<f64>,
    exchange_rate: Option<RateSnapshot>,
    last_update: Option<DateTime<Utc>>,
    /// False until the first sample and after a failed gold fetch
    price_fresh: bool,
    last_feed_error: Option<String>,
}

impl TradingSession {
    pub fn new(history_capacity: usize, positions: PositionManager) -> Self {
        Self::with_strategy(
            history_capacity,
            positions,
            Box::new(MarketAnalyzer::default()),
        )
    }

    pub fn with_strategy(
        history_capacity: usize,
        positions: PositionManager,
        strategy: Box<dyn Strategy>,
    ) -> Self {
        let history = PriceHistoryBuffer::new(history_capacity);
        let latest_analysis = strategy.analyze(&history);

        Self {
            history,
            positions,
            strategy,
            executor: Executor::default(),
            latest_analysis,
            current_price: None,
            usd_per_ounce: None,
            usd_per_gram_24k: None,
            exchange_rate: None,
            last_update: None,
            price_fresh: false,
            last_feed_error: None,
        }
    }

    /// Record a converted price tick from the feed
    pub fn record_tick(&mut self, tick: &PriceTick) -> &AnalysisResult {
        self.usd_per_ounce = Some(tick.usd_per_ounce);
        self.usd_per_gram_24k = tick.usd_per_gram_24k;
        self.exchange_rate = Some(tick.rate_snapshot());
        self.last_feed_error = None;
        self.record_price(tick.price_per_chi, tick.timestamp)
    }

    /// Gold fetch failed: keep history and analysis, mark the price stale
    pub fn record_feed_error(&mut self, error: &FeedError) {
        tracing::warn!("Gold price fetch failed, keeping last data: {}", error);
        self.price_fresh = false;
        self.last_feed_error = Some(error.to_string());
    }

    /// Push one sample and refresh the analysis shown to the display
    ///
    /// Non-positive or non-finite prices are dropped.
    pub fn record_price(&mut self, price: f64, timestamp: DateTime<Utc>) -> &AnalysisResult {
        if !price.is_finite() || price <= 0.0 {
            tracing::warn!(price = price, "Ignoring invalid price sample");
            return &self.latest_analysis;
        }

        self.history.push(price);
        self.current_price = Some(price);
        self.last_update = Some(timestamp);
        self.price_fresh = true;
        self.latest_analysis = self.strategy.analyze(&self.history);

        &self.latest_analysis
    }

    /// Trade timer: close if open, otherwise maybe open (live - uses current time)
    pub fn on_trade_tick(&mut self) -> ExecutionDecision {
        self.on_trade_tick_at(None)
    }

    /// Trade timer with explicit timestamp (for backtesting)
    pub fn on_trade_tick_at(&mut self, timestamp: Option<DateTime<Utc>>) -> ExecutionDecision {
        let analysis = if self.positions.has_open_position() {
            self.latest_analysis.clone()
        } else {
            let fresh = self.strategy.analyze(&self.history);
            self.latest_analysis = fresh.clone();
            fresh
        };

        let decision = self
            .executor
            .decide(&self.positions, &analysis, self.current_price);

        match &decision.action {
            ExecutionAction::Open { side, price } => {
                tracing::info!("🤖 {}", decision.reason);
                if let Err(e) = self.positions.open_at(*side, *price, timestamp) {
                    tracing::warn!("Open refused: {}", e);
                }
            }
            ExecutionAction::Close { price } => {
                self.positions.close_at(*price, timestamp);
            }
            ExecutionAction::Skip => {
                tracing::info!("⏸️  No trade: {}", decision.reason);
            }
            ExecutionAction::Halt => {
                tracing::warn!("⚠️  {}", decision.reason);
            }
        }

        decision
    }

    /// Close any open position outside the trade timer, e.g. at the end of a replay
    pub fn close_open_position_at(
        &mut self,
        price: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> Option<TradeRecord> {
        self.positions.close_at(price, timestamp)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_at(Utc::now())
    }

    pub fn snapshot_at(&self, captured_at: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot::build(self, captured_at)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::from_positions(&self.positions)
    }

    pub fn history(&self) -> &PriceHistoryBuffer {
        &self.history
    }

    pub fn positions(&self) -> &PositionManager {
        &self.positions
    }

    pub fn latest_analysis(&self) -> &AnalysisResult {
        &self.latest_analysis
    }

    pub fn current_price(&self) -> Option<f64> {
        self.current_price
    }

    pub fn usd_per_ounce(&self) -> Option<f64> {
        self.usd_per_ounce
    }

    pub fn usd_per_gram_24k(&self) -> Option<f64> {
        self.usd_per_gram_24k
    }

    pub fn price_fresh(&self) -> bool {
        self.price_fresh
    }

    pub fn last_feed_error(&self) -> Option<&str> {
        self.last_feed_error.as_deref()
    }

    pub fn exchange_rate(&self) -> Option<RateSnapshot> {
        self.exchange_rate
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn min_samples_required(&self) -> usize {
        self.strategy.min_samples_required()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::price_buffer::DEFAULT_HISTORY_CAPACITY;
    use crate::models::{Side, Signal};

    fn session() -> TradingSession {
        TradingSession::new(DEFAULT_HISTORY_CAPACITY, PositionManager::default())
    }

    fn feed(session: &mut TradingSession, prices: impl IntoIterator<Item = f64>) {
        for price in prices {
            session.record_price(price, Utc::now());
        }
    }

    #[test]
    fn test_starts_waiting_with_no_price() {
        let mut s = session();
        assert_eq!(s.latest_analysis().reason, "insufficient history");

        let decision = s.on_trade_tick();
        assert_eq!(decision.action, ExecutionAction::Skip);
        assert!(!s.positions().has_open_position());
    }

    #[test]
    fn test_record_price_refreshes_analysis() {
        let mut s = session();
        feed(&mut s, (0..30).map(|i| 1000.0 + i as f64));

        assert_eq!(s.history().len(), 30);
        assert_eq!(s.current_price(), Some(1029.0));
        assert_eq!(s.latest_analysis().signal, Signal::Long);
    }

    #[test]
    fn test_invalid_price_is_dropped() {
        let mut s = session();
        feed(&mut s, [1000.0, 0.0, f64::NAN, -3.0]);

        assert_eq!(s.history().len(), 1);
        assert_eq!(s.current_price(), Some(1000.0));
    }

    #[test]
    fn test_trade_ticks_alternate_open_and_close() {
        let mut s = session();
        feed(&mut s, (0..30).map(|i| 1000.0 + i as f64));

        let first = s.on_trade_tick();
        assert_eq!(
            first.action,
            ExecutionAction::Open {
                side: Side::Long,
                price: 1029.0
            }
        );
        assert!(s.positions().has_open_position());

        feed(&mut s, (30..42).map(|i| 1000.0 + i as f64));

        // Still a LONG signal, but the open position is closed first
        assert_eq!(s.latest_analysis().signal, Signal::Long);
        let second = s.on_trade_tick();
        assert_eq!(second.action, ExecutionAction::Close { price: 1041.0 });
        assert!(!s.positions().has_open_position());

        let trades = s.positions().trade_history();
        assert_eq!(trades.len(), 1);
        assert!(trades[0].profit_loss > 0.0);
    }

    #[test]
    fn test_halted_session_keeps_recording_prices() {
        let mut s = TradingSession::new(DEFAULT_HISTORY_CAPACITY, PositionManager::new(0.0, 0.3));
        feed(&mut s, (0..30).map(|i| 1000.0 + i as f64));

        let decision = s.on_trade_tick();
        assert_eq!(decision.action, ExecutionAction::Halt);

        s.record_price(2000.0, Utc::now());
        assert_eq!(s.current_price(), Some(2000.0));
        assert_eq!(s.history().len(), 31);
    }

    #[test]
    fn test_summary_and_snapshot_reflect_state() {
        let mut s = session();
        feed(&mut s, (0..30).map(|i| 1000.0 + i as f64));
        s.on_trade_tick();

        let snapshot = s.snapshot();
        assert!(snapshot.position.is_some());
        assert_eq!(snapshot.data_points, 30);
        assert_eq!(snapshot.summary.total_trades, 0);

        s.on_trade_tick();
        let summary = s.summary();
        assert_eq!(summary.total_trades, 1);
    }

    struct AlwaysShort;

    impl Strategy for AlwaysShort {
        fn analyze(&self, _history: &PriceHistoryBuffer) -> AnalysisResult {
            AnalysisResult {
                signal: Signal::Short,
                reason: "always short".to_string(),
                confidence: 99.0,
                indicators: None,
            }
        }

        fn name(&self) -> &str {
            "AlwaysShort"
        }

        fn min_samples_required(&self) -> usize {
            1
        }
    }

    #[test]
    fn test_custom_strategy_drives_trades() {
        let mut s = TradingSession::with_strategy(
            DEFAULT_HISTORY_CAPACITY,
            PositionManager::default(),
            Box::new(AlwaysShort),
        );
        assert_eq!(s.strategy_name(), "AlwaysShort");

        s.record_price(1000.0, Utc::now());
        let decision = s.on_trade_tick();
        assert_eq!(
            decision.action,
            ExecutionAction::Open {
                side: Side::Short,
                price: 1000.0
            }
        );
        assert!(decision.reason.contains("99%"));

        s.record_price(990.0, Utc::now());
        let closed = s.close_open_position_at(990.0, None).unwrap();
        assert!(closed.profit_loss > 0.0);
        assert!(!s.positions().has_open_position());
    }

    fn tick(usd: f64, gram_24k: Option<f64>) -> PriceTick {
        PriceTick {
            usd_per_ounce: usd,
            usd_per_gram_24k: gram_24k,
            exchange_rate: crate::execution::Fetched::Fresh(25_000.0),
            price_per_chi: (usd * 3_000.0).round(),
            source: crate::models::DataSource::GoldApi,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_feed_error_marks_price_stale_until_next_tick() {
        let mut s = session();
        assert!(!s.price_fresh());

        s.record_tick(&tick(2000.0, Some(64.3)));
        assert!(s.price_fresh());
        assert_eq!(s.usd_per_gram_24k(), Some(64.3));

        let error = FeedError::Status {
            source_name: "gold-api.com",
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        };
        s.record_feed_error(&error);

        assert!(!s.price_fresh());
        assert!(s.last_feed_error().unwrap().contains("503"));
        // Last known data survives the outage
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.current_price(), Some(6_000_000.0));

        s.record_tick(&tick(2001.0, None));
        assert!(s.price_fresh());
        assert!(s.last_feed_error().is_none());
        assert_eq!(s.usd_per_gram_24k(), None);
    }
}
