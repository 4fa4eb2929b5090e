use super::{build_http_client, ensure_positive, read_json, FeedError, DEFAULT_TIMEOUT};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const EXCHANGE_RATE_API_BASE: &str = "https://api.exchangerate-api.com";
const SOURCE_NAME: &str = "exchangerate-api.com";

/// Client for USD-based exchange rates
#[derive(Clone)]
pub struct ExchangeRateClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

impl ExchangeRateClient {
    pub fn new() -> Result<Self, FeedError> {
        Self::with_base_url(EXCHANGE_RATE_API_BASE, DEFAULT_TIMEOUT)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// VND per 1 USD
    pub async fn get_usd_vnd(&self) -> Result<f64, FeedError> {
        let url = format!("{}/v4/latest/USD", self.base_url);
        let response = self.client.get(&url).send().await?;
        let body: LatestResponse = read_json(SOURCE_NAME, response).await?;

        let rate = body.rates.get("VND").copied().ok_or(FeedError::MissingField {
            source_name: SOURCE_NAME,
            field: "rates.VND",
        })?;
        ensure_positive(SOURCE_NAME, rate)
    }
}
