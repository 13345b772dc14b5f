//! Third-party price feed.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domains::tools::AdapterError;

/// Failures fetching a price quote.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Price feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Price feed returned HTTP {0}")]
    Status(u16),

    #[error("Invalid API response")]
    InvalidResponse,
}

impl From<FeedError> for AdapterError {
    fn from(err: FeedError) -> Self {
        AdapterError::external(err.to_string())
    }
}

/// One APT/USD quote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub price_usd: f64,
    pub price_change_24h: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
}

impl PriceQuote {
    /// Reject quotes no market could trade at: a price that is zero,
    /// negative or not finite.
    pub fn validated(self) -> Result<Self, FeedError> {
        if self.price_usd.is_finite() && self.price_usd > 0.0 {
            Ok(self)
        } else {
            Err(FeedError::InvalidResponse)
        }
    }
}

/// Source of APT price quotes.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn fetch_price(&self) -> Result<PriceQuote, FeedError>;
}

#[derive(Deserialize)]
struct SimplePriceResponse {
    aptos: Option<SimplePrice>,
}

#[derive(Deserialize)]
struct SimplePrice {
    usd: f64,
    #[serde(default)]
    usd_24h_change: Option<f64>,
    #[serde(default)]
    usd_24h_vol: Option<f64>,
    #[serde(default)]
    usd_market_cap: Option<f64>,
}

impl SimplePriceResponse {
    fn into_quote(self) -> Result<PriceQuote, FeedError> {
        let aptos = self.aptos.ok_or(FeedError::InvalidResponse)?;
        PriceQuote {
            price_usd: aptos.usd,
            price_change_24h: aptos.usd_24h_change.unwrap_or(0.0),
            volume_24h: aptos.usd_24h_vol.unwrap_or(0.0),
            market_cap: aptos.usd_market_cap.unwrap_or(0.0),
        }
        .validated()
    }
}

/// CoinGecko `simple/price` feed.
pub struct CoinGeckoFeed {
    base_url: String,
    client: reqwest::Client,
}

impl CoinGeckoFeed {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("HyperFill-MarketAnalyzer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoFeed {
    async fn fetch_price(&self) -> Result<PriceQuote, FeedError> {
        debug!(base = %self.base_url, "Fetching APT price");
        let response = self
            .client
            .get(format!("{}/simple/price", self.base_url))
            .query(&[
                ("ids", "aptos"),
                ("vs_currencies", "usd"),
                ("include_24hr_change", "true"),
                ("include_24hr_vol", "true"),
                ("include_market_cap", "true"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        let body: SimplePriceResponse = response
            .json()
            .await
            .map_err(|_| FeedError::InvalidResponse)?;
        body.into_quote()
    }
}
