use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::AppConfig;
use crate::execution::position_manager::{DEFAULT_INITIAL_CAPITAL, DEFAULT_MARGIN_FRACTION};
use crate::execution::price_buffer::DEFAULT_HISTORY_CAPACITY;
use crate::execution::{ExecutionAction, PositionManager, TradeRecord, TradingSession};
use crate::report::SessionSummary;

/// Outcome of replaying one price series
#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub summary: SessionSummary,
    pub trades: Vec<TradeRecord>,
    pub samples: usize,
    pub trade_ticks: usize,
    /// Capital ran out before the series ended
    pub halted: bool,
}

/// Replays price samples through a [`TradingSession`] in virtual time
///
/// Samples are one refresh apart; every `refreshes_per_trade` samples the
/// trade tick fires, exactly as the live loop would.
pub struct BacktestRunner {
    initial_capital: f64,
    margin_fraction: f64,
    history_capacity: usize,
    refreshes_per_trade: usize,
    sample_interval: Duration,
}

impl BacktestRunner {
    pub fn new(
        initial_capital: f64,
        margin_fraction: f64,
        history_capacity: usize,
        refreshes_per_trade: usize,
    ) -> Self {
        Self {
            initial_capital,
            margin_fraction,
            history_capacity,
            refreshes_per_trade: refreshes_per_trade.max(1),
            sample_interval: Duration::seconds(5),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut runner = Self::new(
            config.trading.initial_capital,
            config.trading.margin_fraction,
            config.trading.history_capacity,
            config.schedule.refreshes_per_trade(),
        );
        runner.sample_interval = Duration::seconds(config.schedule.price_refresh_secs as i64);
        runner
    }

    /// Run the replay
    ///
    /// A position still open after the last sample is closed at that
    /// sample so the summary covers every trade.
    pub fn run(&self, prices: &[f64]) -> BacktestResult {
        let start: DateTime<Utc> =
            Utc::now() - self.sample_interval * (prices.len() as i32);

        let mut session = TradingSession::new(
            self.history_capacity,
            PositionManager::new(self.initial_capital, self.margin_fraction),
        );

        tracing::info!(
            "Starting backtest: {} samples, trade tick every {} samples",
            prices.len(),
            self.refreshes_per_trade
        );

        let mut trade_ticks = 0;
        let mut halted = false;
        let mut last_ts = start;

        for (i, price) in prices.iter().enumerate() {
            let ts = start + self.sample_interval * (i as i32);
            last_ts = ts;
            session.record_price(*price, ts);

            if (i + 1) % self.refreshes_per_trade == 0 {
                trade_ticks += 1;
                let decision = session.on_trade_tick_at(Some(ts));
                if decision.action == ExecutionAction::Halt {
                    halted = true;
                    break;
                }
            }
        }

        if session.positions().has_open_position() {
            if let Some(price) = session.current_price() {
                session.close_open_position_at(price, Some(last_ts));
            }
        }

        let summary = session.summary();
        tracing::info!(
            "Backtest complete: {} trades, P&L {:.0} ({:+.2}%)",
            summary.total_trades,
            summary.total_pnl,
            summary.return_pct
        );

        BacktestResult {
            summary,
            trades: session.positions().trade_history().to_vec(),
            samples: prices.len(),
            trade_ticks,
            halted,
        }
    }
}

impl Default for BacktestRunner {
    fn default() -> Self {
        Self::new(
            DEFAULT_INITIAL_CAPITAL,
            DEFAULT_MARGIN_FRACTION,
            DEFAULT_HISTORY_CAPACITY,
            12,
        )
    }
}
