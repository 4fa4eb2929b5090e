//! Session statistics and the read-only views handed to display code

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::execution::price_feed::RateSnapshot;
use crate::execution::{PositionManager, TradeRecord, TradingSession};
use crate::models::{AnalysisResult, Side, Signal};

/// Number of closed trades shown on the dashboard
pub const RECENT_TRADES: usize = 5;

/// Win/loss statistics for a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_pnl: f64,
    pub return_pct: f64,
    pub margin_available: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// 0-100, 0 with no trades
    pub win_rate: f64,
}

impl SessionSummary {
    pub fn from_positions(pm: &PositionManager) -> Self {
        let trades = pm.trade_history();
        let winning_trades = trades.iter().filter(|t| t.profit_loss > 0.0).count();
        let losing_trades = trades.iter().filter(|t| t.profit_loss < 0.0).count();

        let win_rate = if trades.is_empty() {
            0.0
        } else {
            winning_trades as f64 / trades.len() as f64 * 100.0
        };

        let return_pct = if pm.initial_capital() != 0.0 {
            pm.total_pnl() / pm.initial_capital() * 100.0
        } else {
            0.0
        };

        Self {
            initial_capital: pm.initial_capital(),
            final_capital: pm.capital(),
            total_pnl: pm.total_pnl(),
            return_pct,
            margin_available: pm.margin_available(),
            total_trades: trades.len(),
            winning_trades,
            losing_trades,
            win_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionSnapshot {
    pub side: Side,
    pub entry_price: f64,
    pub margin: f64,
    pub unrealized_pl: f64,
    pub opened_at: DateTime<Utc>,
}

/// Everything a display needs for one refresh
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub captured_at: DateTime<Utc>,
    pub last_update: Option<DateTime<Utc>>,
    pub usd_per_ounce: Option<f64>,
    pub usd_per_gram_24k: Option<f64>,
    pub exchange_rate: Option<RateSnapshot>,
    pub price_per_chi: Option<f64>,
    /// False when the last gold fetch failed and prices are last known
    pub price_fresh: bool,
    pub feed_error: Option<String>,
    #[serde(flatten)]
    pub summary: SessionSummary,
    pub position: Option<PositionSnapshot>,
    /// Newest first
    pub recent_trades: Vec<TradeRecord>,
    pub analysis: AnalysisResult,
    pub data_points: usize,
    /// Samples the strategy needs before it can signal
    pub min_history: usize,
}

impl SessionSnapshot {
    pub fn build(session: &TradingSession, captured_at: DateTime<Utc>) -> Self {
        let pm = session.positions();
        let price = session.current_price();

        let position = pm.current_position().map(|p| PositionSnapshot {
            side: p.side,
            entry_price: p.entry_price,
            margin: p.margin,
            unrealized_pl: price.map(|px| p.profit_loss_at(px)).unwrap_or(0.0),
            opened_at: p.opened_at,
        });

        let recent_trades = pm
            .trade_history()
            .iter()
            .rev()
            .take(RECENT_TRADES)
            .cloned()
            .collect();

        Self {
            captured_at,
            last_update: session.last_update(),
            usd_per_ounce: session.usd_per_ounce(),
            usd_per_gram_24k: session.usd_per_gram_24k(),
            exchange_rate: session.exchange_rate(),
            price_per_chi: price,
            price_fresh: session.price_fresh(),
            feed_error: session.last_feed_error().map(str::to_string),
            summary: session.summary(),
            position,
            recent_trades,
            analysis: session.latest_analysis().clone(),
            data_points: session.history().len(),
            min_history: session.min_samples_required(),
        }
    }
}

/// Format a VND amount with `.` thousands separators, e.g. `10.000.000`
pub fn format_vnd(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn signed_vnd(amount: f64) -> String {
    if amount >= 0.0 {
        format!("+{}", format_vnd(amount))
    } else {
        format_vnd(amount)
    }
}

fn signal_icon(signal: Signal) -> &'static str {
    match signal {
        Signal::Long => "📈",
        Signal::Short => "📉",
        Signal::Wait => "⏸️",
    }
}

/// Console dashboard for one refresh
pub fn render_dashboard(snapshot: &SessionSnapshot) -> String {
    let min_history = snapshot.min_history;
    let mut out = Vec::new();
    let rule = "═".repeat(72);

    out.push(format!("╔{}╗", rule));
    out.push("  GOLD FUTURES SIMULATOR - LIVE".to_string());
    out.push(format!("╠{}╣", rule));
    out.push(format!(
        "  Time:                {}",
        snapshot.captured_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(error) = &snapshot.feed_error {
        out.push(format!("  ⚠️  CONNECTION ERROR: {}", error));
        match snapshot.last_update {
            Some(ts) => out.push(format!(
                "  Showing last known prices from {} (stale)",
                ts.format("%H:%M:%S UTC")
            )),
            None => out.push("  Retrying on next refresh...".to_string()),
        }
    }
    if let Some(rate) = snapshot.exchange_rate {
        let stale = if rate.fresh { "" } else { " (stale)" };
        out.push(format!("  USD/VND:             1 USD = {}đ{}", format_vnd(rate.rate), stale));
    }
    match (snapshot.usd_per_ounce, snapshot.price_per_chi) {
        (Some(usd), Some(vnd)) => {
            let stale = if snapshot.price_fresh { "" } else { " (stale)" };
            out.push(format!("  Gold (USD/oz):       ${:.2}{}", usd, stale));
            if let Some(gram) = snapshot.usd_per_gram_24k {
                out.push(format!("  Gold 24K (USD/g):    ${:.2}", gram));
            }
            out.push(format!("  Gold (VND/chỉ):      {}đ{}", format_vnd(vnd), stale));
        }
        _ => out.push("  No gold price yet".to_string()),
    }

    let s = &snapshot.summary;
    out.push(format!("╠{}╣", rule));
    out.push(format!("  Capital:             {}đ", format_vnd(s.final_capital)));
    out.push(format!("  Total P&L:           {}đ", signed_vnd(s.total_pnl)));
    out.push(format!("  Margin available:    {}đ", format_vnd(s.margin_available)));
    out.push(format!("  Trades:              {}", s.total_trades));

    if let Some(p) = &snapshot.position {
        out.push(format!("╠{}╣", rule));
        out.push(format!("  OPEN POSITION:       {}", p.side));
        out.push(format!("  Entry:               {}đ", format_vnd(p.entry_price)));
        out.push(format!("  Margin:              {}đ", format_vnd(p.margin)));
        out.push(format!("  Unrealized P&L:      {}đ", signed_vnd(p.unrealized_pl)));
    }
    out.push(format!("╚{}╝", rule));

    if snapshot.data_points >= min_history {
        let a = &snapshot.analysis;
        out.push(String::new());
        out.push("📈 MARKET ANALYSIS:".to_string());
        out.push(format!("   Signal:       {} {}", a.signal, signal_icon(a.signal)));
        out.push(format!("   Confidence:   {:.0}%", a.confidence));
        out.push(format!("   Reason:       {}", a.reason));
        if let Some(ind) = &a.indicators {
            out.push(format!(
                "   MA5: {}đ | MA10: {}đ | MA20: {}đ",
                format_vnd(ind.ma5),
                format_vnd(ind.ma10),
                format_vnd(ind.ma20)
            ));
            out.push(format!(
                "   Momentum:     {}đ ({:.2}%)",
                signed_vnd(ind.momentum),
                ind.momentum_percent
            ));
        }
    } else {
        out.push(format!(
            "\n⏳ Collecting data... ({}/{} points)",
            snapshot.data_points, min_history
        ));
    }

    if !snapshot.recent_trades.is_empty() {
        out.push(String::new());
        out.push("📊 RECENT TRADES:".to_string());
        for t in &snapshot.recent_trades {
            let (mark, label) = if t.profit_loss >= 0.0 {
                ("✅", "Profit")
            } else {
                ("❌", "Loss")
            };
            out.push(format!(
                "{} {} | In: {}đ → Out: {}đ | {}: {}đ",
                mark,
                t.side,
                format_vnd(t.entry_price),
                format_vnd(t.exit_price),
                label,
                format_vnd(t.profit_loss.abs())
            ));
        }
    }

    out.join("\n")
}

/// End-of-session report
pub fn render_summary(summary: &SessionSummary) -> String {
    let rule = "═".repeat(72);
    [
        format!("╔{}╗", rule),
        "  SESSION CLOSED".to_string(),
        format!("╠{}╣", rule),
        format!("  Initial capital:     {}đ", format_vnd(summary.initial_capital)),
        format!("  Final capital:       {}đ", format_vnd(summary.final_capital)),
        format!("  Total P&L:           {}đ", signed_vnd(summary.total_pnl)),
        format!("  Return:              {:+.2}%", summary.return_pct),
        format!("  Trades:              {}", summary.total_trades),
        format!("  Winning:             {}", summary.winning_trades),
        format!("  Losing:              {}", summary.losing_trades),
        format!("  Win rate:            {:.2}%", summary.win_rate),
        format!("╚{}╝", rule),
    ]
    .join("\n")
}
