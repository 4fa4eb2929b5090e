pub mod exchange_rate;
pub mod gold_api;
pub mod metal_price;

pub use exchange_rate::ExchangeRateClient;
pub use gold_api::GoldApiClient;
pub use metal_price::MetalPriceClient;

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure fetching or decoding a quote from an external source
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{source_name} returned status {status}")]
    Status {
        source_name: &'static str,
        status: reqwest::StatusCode,
    },
    #[error("Failed to parse {source_name} response: {detail}")]
    Parse {
        source_name: &'static str,
        detail: String,
    },
    #[error("{source_name} response missing `{field}`")]
    MissingField {
        source_name: &'static str,
        field: &'static str,
    },
    #[error("{source_name} returned invalid value {value}")]
    InvalidPrice {
        source_name: &'static str,
        value: f64,
    },
    #[error("Price refresh timed out after {0:?}")]
    Timeout(Duration),
}

/// Numeric JSON field that some APIs send as a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    pub(crate) fn to_f64(&self, source_name: &'static str) -> Result<f64, FeedError> {
        match self {
            NumberOrString::Number(n) => Ok(*n),
            NumberOrString::Text(s) => s.trim().parse().map_err(|_| FeedError::Parse {
                source_name,
                detail: format!("not a number: {:?}", s),
            }),
        }
    }
}

/// Reject zero, negative and non-finite quotes
pub(crate) fn ensure_positive(source_name: &'static str, value: f64) -> Result<f64, FeedError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(FeedError::InvalidPrice { source_name, value })
    }
}

/// Build the shared reqwest client used by every source
pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, FeedError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Read a JSON body, mapping non-2xx statuses and decode errors
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    source_name: &'static str,
    response: reqwest::Response,
) -> Result<T, FeedError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::Status {
            source_name,
            status,
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| FeedError::Parse {
        source_name,
        detail: e.to_string(),
    })
}
