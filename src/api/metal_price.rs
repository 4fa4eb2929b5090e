use super::{build_http_client, ensure_positive, read_json, FeedError, DEFAULT_TIMEOUT};
use crate::models::{DataSource, GoldQuote};
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const METAL_PRICE_API_BASE: &str = "https://api.metalpriceapi.com";
const SOURCE_NAME: &str = "metalpriceapi.com";

/// Client for metalpriceapi.com (requires a free API key)
///
/// Quotes come back as ounces of XAU per USD, so the spot price is the
/// reciprocal rounded to cents.
#[derive(Clone)]
pub struct MetalPriceClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

impl MetalPriceClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, FeedError> {
        Self::with_base_url(METAL_PRICE_API_BASE, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub async fn get_price(&self) -> Result<GoldQuote, FeedError> {
        let url = format!("{}/v1/latest", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("base", "USD"),
                ("currencies", "XAU"),
            ])
            .send()
            .await?;
        let body: LatestRatesResponse = read_json(SOURCE_NAME, response).await?;

        let rate = body.rates.get("XAU").copied().ok_or(FeedError::MissingField {
            source_name: SOURCE_NAME,
            field: "rates.XAU",
        })?;
        let rate = ensure_positive(SOURCE_NAME, rate)?;
        let usd_per_ounce = ((1.0 / rate) * 100.0).round() / 100.0;

        Ok(GoldQuote {
            usd_per_ounce,
            usd_per_gram_24k: None,
            source: DataSource::MetalPrice,
            timestamp: Utc::now(),
        })
    }
}
