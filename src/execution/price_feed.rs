use crate::api::{ExchangeRateClient, FeedError, GoldApiClient, MetalPriceClient};
use crate::models::{DataSource, GoldQuote};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Fallback USD→VND rate used until the first successful fetch
pub const DEFAULT_EXCHANGE_RATE: f64 = 24_500.0;
pub const GRAMS_PER_TROY_OUNCE: f64 = 31.1035;
pub const GRAMS_PER_CHI: f64 = 3.75;

/// A value that is either freshly fetched or the last known one
#[derive(Debug)]
pub enum Fetched<T> {
    Fresh(T),
    /// Fetch failed; `value` is the last known value
    Stale { value: T, error: FeedError },
}

impl<T: Copy> Fetched<T> {
    pub fn value(&self) -> T {
        match self {
            Fetched::Fresh(v) => *v,
            Fetched::Stale { value, .. } => *value,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Fetched::Fresh(_))
    }
}

/// Where the gold spot price comes from
#[derive(Clone)]
pub enum GoldSource {
    GoldApi(GoldApiClient),
    MetalPrice(MetalPriceClient),
}

impl GoldSource {
    async fn get_price(&self) -> Result<GoldQuote, FeedError> {
        match self {
            GoldSource::GoldApi(client) => client.get_price().await,
            GoldSource::MetalPrice(client) => client.get_price().await,
        }
    }
}

/// One price refresh, converted to VND per chỉ
#[derive(Debug)]
pub struct PriceTick {
    pub usd_per_ounce: f64,
    /// 24K price per gram, gold-api.com only
    pub usd_per_gram_24k: Option<f64>,
    pub exchange_rate: Fetched<f64>,
    /// Whole VND per chỉ
    pub price_per_chi: f64,
    pub source: DataSource,
    pub timestamp: DateTime<Utc>,
}

/// Exchange rate plus freshness, as shown to the display side
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RateSnapshot {
    pub rate: f64,
    pub fresh: bool,
}

impl PriceTick {
    pub fn rate_snapshot(&self) -> RateSnapshot {
        RateSnapshot {
            rate: self.exchange_rate.value(),
            fresh: self.exchange_rate.is_fresh(),
        }
    }
}

/// Convert a USD/oz spot price to whole VND per chỉ
pub fn usd_per_ounce_to_vnd_per_chi(usd_per_ounce: f64, usd_vnd: f64) -> f64 {
    (usd_per_ounce * usd_vnd * (GRAMS_PER_CHI / GRAMS_PER_TROY_OUNCE)).round()
}

/// Manages price data collection: gold spot plus USD→VND rate
pub struct PriceFeedManager {
    gold: GoldSource,
    fx: ExchangeRateClient,
    last_exchange_rate: f64,
}

impl PriceFeedManager {
    pub fn new(gold: GoldSource, fx: ExchangeRateClient, fallback_exchange_rate: f64) -> Self {
        Self {
            gold,
            fx,
            last_exchange_rate: fallback_exchange_rate,
        }
    }

    /// Fetch gold and FX concurrently and build a tick
    ///
    /// An FX failure falls back to the last known rate; a gold failure
    /// fails the whole tick so the caller keeps its stale history.
    pub async fn fetch_tick(&mut self) -> Result<PriceTick, FeedError> {
        let (gold, fx) = tokio::join!(self.gold.get_price(), self.fx.get_usd_vnd());

        let exchange_rate = match fx {
            Ok(rate) => {
                self.last_exchange_rate = rate;
                Fetched::Fresh(rate)
            }
            Err(error) => {
                tracing::warn!(
                    fallback = self.last_exchange_rate,
                    "Exchange rate fetch failed, using last known rate: {}",
                    error
                );
                Fetched::Stale {
                    value: self.last_exchange_rate,
                    error,
                }
            }
        };

        let quote = gold?;
        let price_per_chi = usd_per_ounce_to_vnd_per_chi(quote.usd_per_ounce, exchange_rate.value());

        tracing::info!(
            usd_per_ounce = quote.usd_per_ounce,
            usd_vnd = exchange_rate.value(),
            vnd_per_chi = price_per_chi,
            "Fetched price snapshot"
        );

        Ok(PriceTick {
            usd_per_ounce: quote.usd_per_ounce,
            usd_per_gram_24k: quote.usd_per_gram_24k,
            exchange_rate,
            price_per_chi,
            source: quote.source,
            timestamp: quote.timestamp,
        })
    }

    /// [`fetch_tick`](Self::fetch_tick) bounded by `limit`, retries included
    ///
    /// The live loop uses the refresh interval so a hanging source never
    /// holds up the trade timer or Ctrl+C past one refresh.
    pub async fn fetch_tick_within(&mut self, limit: Duration) -> Result<PriceTick, FeedError> {
        match tokio::time::timeout(limit, self.fetch_tick()).await {
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout(limit)),
        }
    }

    /// Last known USD→VND rate
    pub fn last_exchange_rate(&self) -> f64 {
        self.last_exchange_rate
    }
}
