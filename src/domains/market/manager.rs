//! Market manager - resolves market names to clients.

use serde::Serialize;

use super::analytics::{MarketAnalysis, MarketSnapshot, OrderBook};
use super::client::{MarketClient, SentimentReport, TrendReport, VolatilityReport};
use crate::domains::tools::AdapterError;

/// Name of the only supported market.
pub const HYPERFILL_MARKET: &str = "hyperfill";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketListing {
    pub market_name: String,
    pub id: String,
}

/// Market-data adapter.
pub struct MarketManager {
    markets: Vec<MarketListing>,
    hyperfill: MarketClient,
}

impl MarketManager {
    pub fn new(hyperfill: MarketClient) -> Self {
        Self {
            markets: vec![MarketListing {
                market_name: HYPERFILL_MARKET.to_string(),
                id: "123".to_string(),
            }],
            hyperfill,
        }
    }

    pub fn market_list(&self) -> Vec<MarketListing> {
        self.markets.clone()
    }

    pub fn client(&self, market_name: &str) -> Result<&MarketClient, AdapterError> {
        match market_name {
            HYPERFILL_MARKET => Ok(&self.hyperfill),
            other => Err(AdapterError::not_found(format!(
                "Market client not found for {other}"
            ))),
        }
    }

    pub async fn market_data(&self, market_name: &str) -> Result<MarketSnapshot, AdapterError> {
        Ok(self.client(market_name)?.market_data().await)
    }

    pub async fn order_book(&self, market_name: &str) -> Result<OrderBook, AdapterError> {
        Ok(self.client(market_name)?.order_book().await)
    }

    pub async fn market_analysis(&self, market_name: &str) -> Result<MarketAnalysis, AdapterError> {
        Ok(self.client(market_name)?.market_analysis().await)
    }

    pub async fn trend(&self, market_name: &str) -> Result<TrendReport, AdapterError> {
        Ok(self.client(market_name)?.trend().await)
    }

    pub async fn volatility(&self, market_name: &str) -> Result<VolatilityReport, AdapterError> {
        Ok(self.client(market_name)?.volatility().await)
    }

    pub async fn sentiment(&self, market_name: &str) -> Result<SentimentReport, AdapterError> {
        Ok(self.client(market_name)?.sentiment().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::testing::{FeedBehavior, MockFeed};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn manager() -> (MarketManager, Arc<MockFeed>) {
        let feed = Arc::new(MockFeed::new(FeedBehavior::Fail));
        let client = MarketClient::new(feed.clone(), Duration::from_secs(5));
        (MarketManager::new(client), feed)
    }

    #[test]
    fn test_market_list() {
        let (manager, _) = manager();
        assert_eq!(
            serde_json::to_value(manager.market_list()).unwrap(),
            json!([{ "marketName": "hyperfill", "id": "123" }])
        );
    }

    #[tokio::test]
    async fn test_unknown_market_is_not_found_without_feed_call() {
        let (manager, feed) = manager();
        let err = manager.market_data("binance").await.unwrap_err();
        assert_eq!(err, AdapterError::not_found("Market client not found for binance"));
        assert_eq!(feed.calls(), 0);
    }

    #[tokio::test]
    async fn test_known_market_routes_to_client() {
        let (manager, feed) = manager();
        let volatility = manager.volatility(HYPERFILL_MARKET).await.unwrap();
        assert_eq!(volatility.volatility, 0.025);
        assert_eq!(feed.calls(), 1);
    }
}
