//! Configuration for goldbot
//!
//! Built-in defaults, then an optional config file, then `GOLDBOT__*`
//! environment variables (a `.env` file is loaded first).

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::api::exchange_rate::EXCHANGE_RATE_API_BASE;
use crate::api::gold_api::GOLD_API_BASE;
use crate::api::metal_price::METAL_PRICE_API_BASE;
use crate::strategy::{MarketAnalyzer, Strategy};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub trading: TradingConfig,
    pub schedule: ScheduleConfig,
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// Starting capital in VND
    pub initial_capital: f64,
    /// Share of current capital committed as margin per trade
    pub margin_fraction: f64,
    /// Price samples kept for analysis
    pub history_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    pub price_refresh_secs: u64,
    pub trade_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub gold_api_url: String,
    pub metal_price_url: String,
    pub metal_price_api_key: Option<String>,
    pub exchange_rate_url: String,
    /// USD→VND rate used until the first successful fetch
    pub fallback_exchange_rate: f64,
    pub request_timeout_secs: u64,
}

impl ScheduleConfig {
    pub fn price_refresh(&self) -> Duration {
        Duration::from_secs(self.price_refresh_secs)
    }

    pub fn trade_interval(&self) -> Duration {
        Duration::from_secs(self.trade_interval_secs)
    }

    /// Price refreshes per trade tick
    pub fn refreshes_per_trade(&self) -> usize {
        (self.trade_interval_secs / self.price_refresh_secs.max(1)).max(1) as usize
    }
}

impl FeedConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration. `path` replaces the default `config/default` and
    /// `config/local` lookup.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::build(
            path,
            Environment::with_prefix("GOLDBOT")
                .separator("__")
                .try_parsing(true),
        )?;
        config.validate()?;
        Ok(config)
    }

    fn build(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder()
            // Trading defaults
            .set_default("trading.initial_capital", 10_000_000.0)?
            .set_default("trading.margin_fraction", 0.30)?
            .set_default("trading.history_capacity", 50)?
            // Schedule defaults
            .set_default("schedule.price_refresh_secs", 5)?
            .set_default("schedule.trade_interval_secs", 60)?
            // Feed defaults
            .set_default("feed.gold_api_url", GOLD_API_BASE)?
            .set_default("feed.metal_price_url", METAL_PRICE_API_BASE)?
            .set_default("feed.exchange_rate_url", EXCHANGE_RATE_API_BASE)?
            .set_default("feed.fallback_exchange_rate", 24_500.0)?
            .set_default("feed.request_timeout_secs", 5)?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name("config/local").required(false)),
        };

        let config = builder
            .add_source(env)
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.trading;
        if !t.initial_capital.is_finite() || t.initial_capital <= 0.0 {
            bail!("trading.initial_capital must be positive, got {}", t.initial_capital);
        }
        if !(t.margin_fraction > 0.0 && t.margin_fraction <= 1.0) {
            bail!("trading.margin_fraction must be in (0, 1], got {}", t.margin_fraction);
        }
        let min_history = MarketAnalyzer::default().min_samples_required();
        if t.history_capacity < min_history {
            bail!(
                "trading.history_capacity ({}) is below the {} samples the analyzer needs",
                t.history_capacity,
                min_history
            );
        }

        let s = &self.schedule;
        if s.price_refresh_secs == 0 || s.trade_interval_secs == 0 {
            bail!("schedule intervals must be non-zero");
        }
        if s.trade_interval_secs < s.price_refresh_secs {
            bail!(
                "schedule.trade_interval_secs ({}) is shorter than price_refresh_secs ({})",
                s.trade_interval_secs,
                s.price_refresh_secs
            );
        }

        if self.feed.fallback_exchange_rate <= 0.0 {
            bail!("feed.fallback_exchange_rate must be positive");
        }

        Ok(())
    }

    /// Config digest for startup logging (never prints the API key)
    pub fn digest(&self) -> String {
        format!(
            "capital={} margin={:.0}% history={} refresh={}s trade={}s metal_key={}",
            self.trading.initial_capital,
            self.trading.margin_fraction * 100.0,
            self.trading.history_capacity,
            self.schedule.price_refresh_secs,
            self.schedule.trade_interval_secs,
            if self.feed.metal_price_api_key.is_some() {
                "set"
            } else {
                "unset"
            }
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
