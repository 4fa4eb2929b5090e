use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an open position
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// Trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Long,
    Short,
    Wait,
}

impl Signal {
    /// Side to open for this signal, `None` for WAIT
    pub fn side(self) -> Option<Side> {
        match self {
            Signal::Long => Some(Side::Long),
            Signal::Short => Some(Side::Short),
            Signal::Wait => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Long => write!(f, "LONG"),
            Signal::Short => write!(f, "SHORT"),
            Signal::Wait => write!(f, "WAIT"),
        }
    }
}

/// Data source identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataSource {
    GoldApi,
    MetalPrice,
}

/// Gold spot quote as returned by a price source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldQuote {
    pub usd_per_ounce: f64,
    /// Only reported by gold-api.com
    pub usd_per_gram_24k: Option<f64>,
    pub source: DataSource,
    pub timestamp: DateTime<Utc>,
}

/// Indicator values behind an analysis
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Indicators {
    pub current_price: f64,
    pub ma5: f64,
    pub ma10: f64,
    pub ma20: f64,
    pub momentum: f64,
    pub momentum_percent: f64,
    pub volatility: f64,
    pub volatility_percent: f64,
}

/// Outcome of one market analysis pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub signal: Signal,
    pub reason: String,
    /// 0-100
    pub confidence: f64,
    /// `None` when there was not enough history to compute them
    pub indicators: Option<Indicators>,
}

impl AnalysisResult {
    pub fn wait(reason: impl Into<String>) -> Self {
        Self {
            signal: Signal::Wait,
            reason: reason.into(),
            confidence: 0.0,
            indicators: None,
        }
    }
}
