use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Side;

/// Starting capital in VND
pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000_000.0;
/// Share of capital committed as margin on every open
pub const DEFAULT_MARGIN_FRACTION: f64 = 0.30;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("Already have open {side} position @ {entry_price}")]
    AlreadyOpen { side: Side, entry_price: f64 },
    #[error("Invalid entry price: {0}")]
    InvalidPrice(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub side: Side,
    pub entry_price: f64,
    pub margin: f64,
    /// 1 / margin fraction
    pub leverage: f64,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// P&L if the position were closed at `price`
    ///
    /// margin * leverage equals the capital at open, so this is the price
    /// move in percent applied to that capital.
    pub fn profit_loss_at(&self, price: f64) -> f64 {
        let change = match self.side {
            Side::Long => price - self.entry_price,
            Side::Short => self.entry_price - price,
        };
        change / self.entry_price * self.margin * self.leverage
    }
}

/// Closed trade, immutable once recorded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub id: Uuid,
    pub side: Side,
    pub entry_price: f64,
    pub exit_price: f64,
    pub profit_loss: f64,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub capital_after: f64,
}

impl TradeRecord {
    /// P&L as percent of the margin committed
    pub fn return_on_margin_pct(&self, margin: f64) -> f64 {
        if margin == 0.0 {
            return 0.0;
        }
        self.profit_loss / margin * 100.0
    }
}

/// Single-slot position book with capital and trade history
#[derive(Debug, Clone)]
pub struct PositionManager {
    position: Option<Position>,
    history: Vec<TradeRecord>,
    capital: f64,
    initial_capital: f64,
    margin_fraction: f64,
}

impl PositionManager {
    pub fn new(initial_capital: f64, margin_fraction: f64) -> Self {
        Self {
            position: None,
            history: Vec::new(),
            capital: initial_capital,
            initial_capital,
            margin_fraction,
        }
    }

    /// Open a position at `price` (live trading - uses current time)
    pub fn open(&mut self, side: Side, price: f64) -> Result<&Position, PositionError> {
        self.open_at(side, price, None)
    }

    /// Open a position with explicit timestamp (for backtesting)
    ///
    /// Refused without touching state if a position is already open.
    pub fn open_at(
        &mut self,
        side: Side,
        price: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<&Position, PositionError> {
        if let Some(existing) = &self.position {
            return Err(PositionError::AlreadyOpen {
                side: existing.side,
                entry_price: existing.entry_price,
            });
        }

        // Entry price is the P&L divisor
        if !price.is_finite() || price <= 0.0 {
            return Err(PositionError::InvalidPrice(price));
        }

        let margin = self.capital * self.margin_fraction;
        let position = Position {
            side,
            entry_price: price,
            margin,
            leverage: 1.0 / self.margin_fraction,
            opened_at: timestamp.unwrap_or_else(Utc::now),
        };

        tracing::info!(
            side = %side,
            price = price,
            margin = margin,
            "🔔 Opened position"
        );

        Ok(self.position.insert(position))
    }

    /// Close the open position (live trading - uses current time)
    pub fn close(&mut self, exit_price: f64) -> Option<TradeRecord> {
        self.close_at(exit_price, None)
    }

    /// Close the open position with explicit timestamp (for backtesting)
    ///
    /// No-op returning `None` when flat. Capital is not floored.
    pub fn close_at(
        &mut self,
        exit_price: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> Option<TradeRecord> {
        let position = self.position.take()?;
        let profit_loss = position.profit_loss_at(exit_price);

        self.capital += profit_loss;

        let record = TradeRecord {
            id: Uuid::new_v4(),
            side: position.side,
            entry_price: position.entry_price,
            exit_price,
            profit_loss,
            opened_at: position.opened_at,
            closed_at: timestamp.unwrap_or_else(Utc::now),
            capital_after: self.capital,
        };

        tracing::info!(
            side = %record.side,
            entry = record.entry_price,
            exit = exit_price,
            pnl = profit_loss,
            pnl_on_margin_pct = record.return_on_margin_pct(position.margin),
            capital = self.capital,
            "💰 Closed position"
        );

        self.history.push(record.clone());
        Some(record)
    }

    /// P&L of the open position at `current_price`, `None` when flat
    pub fn unrealized_pl(&self, current_price: f64) -> Option<f64> {
        self.position
            .as_ref()
            .map(|p| p.profit_loss_at(current_price))
    }

    pub fn has_open_position(&self) -> bool {
        self.position.is_some()
    }

    pub fn current_position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Closed trades, oldest first
    pub fn trade_history(&self) -> &[TradeRecord] {
        &self.history
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn margin_fraction(&self) -> f64 {
        self.margin_fraction
    }

    /// Margin the next open would commit
    pub fn margin_available(&self) -> f64 {
        self.capital * self.margin_fraction
    }

    /// Get total realized P&L
    pub fn total_pnl(&self) -> f64 {
        self.capital - self.initial_capital
    }
}

impl Default for PositionManager {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_CAPITAL, DEFAULT_MARGIN_FRACTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_open_position() {
        let mut pm = PositionManager::default();
        let position = pm.open(Side::Long, 1000.0).unwrap().clone();

        assert!(pm.has_open_position());
        assert_eq!(position.side, Side::Long);
        assert_eq!(position.entry_price, 1000.0);
        assert_relative_eq!(position.margin, 3_000_000.0);
        assert_relative_eq!(position.leverage, 1.0 / 0.3);
    }

    #[test]
    fn test_prevent_second_position() {
        let mut pm = PositionManager::default();
        pm.open(Side::Long, 1000.0).unwrap();

        let result = pm.open(Side::Short, 1100.0);
        assert_eq!(
            result.unwrap_err(),
            PositionError::AlreadyOpen {
                side: Side::Long,
                entry_price: 1000.0
            }
        );

        // Original position untouched
        let position = pm.current_position().unwrap();
        assert_eq!(position.side, Side::Long);
        assert_eq!(position.entry_price, 1000.0);
    }

    #[test]
    fn test_reject_non_positive_entry_price() {
        let mut pm = PositionManager::default();

        assert_eq!(
            pm.open(Side::Long, 0.0).unwrap_err(),
            PositionError::InvalidPrice(0.0)
        );
        assert!(pm.open(Side::Short, -5.0).is_err());
        assert!(pm.open(Side::Short, f64::NAN).is_err());
        assert!(!pm.has_open_position());
    }

    #[test]
    fn test_long_profit_is_price_change_times_capital() {
        let mut pm = PositionManager::default();
        pm.open(Side::Long, 1000.0).unwrap();

        let trade = pm.close(1100.0).unwrap();

        // margin * leverage == capital, so +10% price => +10% capital
        assert_relative_eq!(trade.profit_loss, 1_000_000.0, epsilon = 1e-6);
        assert_relative_eq!(pm.capital(), 11_000_000.0, epsilon = 1e-6);
        assert_relative_eq!(trade.capital_after, pm.capital());
        assert!(!pm.has_open_position());
    }

    #[test]
    fn test_short_profit_when_price_falls() {
        let mut pm = PositionManager::default();
        pm.open(Side::Short, 1000.0).unwrap();

        let trade = pm.close(950.0).unwrap();
        assert_relative_eq!(trade.profit_loss, 500_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_short_loss_when_price_rises() {
        let mut pm = PositionManager::default();
        pm.open(Side::Short, 1000.0).unwrap();

        let trade = pm.close(1020.0).unwrap();
        assert_relative_eq!(trade.profit_loss, -200_000.0, epsilon = 1e-6);
        assert_relative_eq!(pm.total_pnl(), -200_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_round_trip_at_same_price() {
        let mut pm = PositionManager::default();
        pm.open(Side::Long, 1234.0).unwrap();

        let trade = pm.close(1234.0).unwrap();
        assert_eq!(trade.profit_loss, 0.0);
        assert_eq!(pm.capital(), DEFAULT_INITIAL_CAPITAL);
    }

    #[test]
    fn test_close_without_position_is_noop() {
        let mut pm = PositionManager::default();

        assert!(pm.close(1000.0).is_none());
        assert_eq!(pm.capital(), DEFAULT_INITIAL_CAPITAL);
        assert!(pm.trade_history().is_empty());
    }

    #[test]
    fn test_unrealized_pl_does_not_mutate() {
        let mut pm = PositionManager::default();
        assert_eq!(pm.unrealized_pl(1000.0), None);

        pm.open(Side::Long, 1000.0).unwrap();
        let pl = pm.unrealized_pl(1050.0).unwrap();

        assert_relative_eq!(pl, 500_000.0, epsilon = 1e-6);
        assert!(pm.has_open_position());
        assert_eq!(pm.capital(), DEFAULT_INITIAL_CAPITAL);
    }

    #[test]
    fn test_margin_follows_capital() {
        let mut pm = PositionManager::default();
        pm.open(Side::Long, 1000.0).unwrap();
        pm.close(1100.0);

        assert_relative_eq!(pm.margin_available(), 3_300_000.0, epsilon = 1e-6);
        let position = pm.open(Side::Long, 1100.0).unwrap();
        assert_relative_eq!(position.margin, 3_300_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_capital_can_go_negative() {
        let mut pm = PositionManager::default();
        pm.open(Side::Short, 1000.0).unwrap();

        // Price doubles against a short: -100% of capital
        pm.close(2500.0);
        assert!(pm.capital() < 0.0);
    }

    #[test]
    fn test_history_is_append_only_in_order() {
        let mut pm = PositionManager::default();
        let t0 = Utc::now();

        pm.open_at(Side::Long, 1000.0, Some(t0)).unwrap();
        pm.close_at(1010.0, Some(t0 + chrono::Duration::seconds(60)));
        pm.open_at(Side::Short, 1010.0, Some(t0 + chrono::Duration::seconds(120)))
            .unwrap();
        pm.close_at(1000.0, Some(t0 + chrono::Duration::seconds(180)));

        let history = pm.trade_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].side, Side::Long);
        assert_eq!(history[0].opened_at, t0);
        assert_eq!(history[1].side, Side::Short);
        assert!(history[1].closed_at > history[0].closed_at);
        assert_ne!(history[0].id, history[1].id);
    }
}
