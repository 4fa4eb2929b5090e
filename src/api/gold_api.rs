use super::{build_http_client, ensure_positive, read_json, FeedError, NumberOrString, DEFAULT_TIMEOUT};
use crate::models::{DataSource, GoldQuote};
use chrono::Utc;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

pub const GOLD_API_BASE: &str = "https://api.gold-api.com";
const SOURCE_NAME: &str = "gold-api.com";
const RATE_LIMIT_RPM: u32 = 60;
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(2000);

type GoldApiRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Client for the free gold-api.com spot price endpoint
///
/// Cloneable; clones share the rate limiter.
#[derive(Clone)]
pub struct GoldApiClient {
    client: Client,
    base_url: String,
    rate_limiter: Arc<GoldApiRateLimiter>,
    max_retries: u32,
    initial_backoff: Duration,
}

#[derive(Debug, Deserialize)]
struct GoldApiResponse {
    price: Option<NumberOrString>,
    price_gram_24k: Option<NumberOrString>,
}

impl GoldApiClient {
    pub fn new() -> Result<Self, FeedError> {
        Self::with_base_url(GOLD_API_BASE, DEFAULT_TIMEOUT)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let quota = Quota::per_minute(NonZeroU32::new(RATE_LIMIT_RPM).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            max_retries: MAX_RETRIES,
            initial_backoff: INITIAL_BACKOFF,
        })
    }

    /// Override the retry policy (at least one attempt is always made)
    pub fn with_retry(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.initial_backoff = initial_backoff;
        self
    }

    /// Get the current XAU spot price
    /// Includes retry logic with exponential backoff for transient failures
    pub async fn get_price(&self) -> Result<GoldQuote, FeedError> {
        let mut attempt = 1;

        loop {
            match self.fetch_price_once().await {
                Ok(quote) => {
                    if attempt > 1 {
                        tracing::info!("✓ Fetched gold price after {} attempts", attempt);
                    }
                    return Ok(quote);
                }
                Err(e) if attempt < self.max_retries => {
                    let backoff = self.initial_backoff * 2_u32.pow(attempt - 1);
                    tracing::warn!(
                        "Attempt {}/{} failed for {}: {}. Retrying in {:?}...",
                        attempt,
                        self.max_retries,
                        SOURCE_NAME,
                        e,
                        backoff
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Internal method to fetch price once (without retry logic)
    async fn fetch_price_once(&self) -> Result<GoldQuote, FeedError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/price/XAU", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .send()
            .await?;
        let body: GoldApiResponse = read_json(SOURCE_NAME, response).await?;

        let price = body.price.ok_or(FeedError::MissingField {
            source_name: SOURCE_NAME,
            field: "price",
        })?;
        let usd_per_ounce = ensure_positive(SOURCE_NAME, price.to_f64(SOURCE_NAME)?)?;
        let usd_per_gram_24k = body
            .price_gram_24k
            .and_then(|p| p.to_f64(SOURCE_NAME).ok());

        Ok(GoldQuote {
            usd_per_ounce,
            usd_per_gram_24k,
            source: DataSource::GoldApi,
            timestamp: Utc::now(),
        })
    }
}
