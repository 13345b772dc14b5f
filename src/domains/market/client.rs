//! Market client for the HyperFill market.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use tracing::warn;

use super::analytics::{self, MarketAnalysis, MarketSnapshot, OrderBook, Sentiment, Trend};
use super::feed::PriceFeed;
use crate::domains::bounded;

/// Snapshot served when the price feed is unavailable.
pub const FALLBACK_PRICE: f64 = 12.50;
pub const FALLBACK_VOLUME_24H: f64 = 150_000_000.0;
pub const FALLBACK_CHANGE_24H: f64 = 2.5;
pub const FALLBACK_MARKET_CAP: f64 = 5_000_000_000.0;

#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub trend: Trend,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VolatilityReport {
    pub volatility: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentimentReport {
    pub sentiment: Sentiment,
    pub timestamp: String,
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

pub struct MarketClient {
    feed: Arc<dyn PriceFeed>,
    timeout: Duration,
}

impl MarketClient {
    pub fn new(feed: Arc<dyn PriceFeed>, timeout: Duration) -> Self {
        Self { feed, timeout }
    }

    /// Current snapshot; never fails.
    pub async fn market_data(&self) -> MarketSnapshot {
        let quote = async { self.feed.fetch_price().await.and_then(|q| q.validated()) };
        match bounded(self.timeout, quote).await {
            Ok(quote) => MarketSnapshot {
                price: quote.price_usd,
                volume_24h: quote.volume_24h,
                price_change_24h: quote.price_change_24h,
                market_cap: quote.market_cap,
                timestamp: now(),
                error: None,
            },
            Err(e) => {
                warn!("Price feed unavailable, serving fallback snapshot: {}", e);
                MarketSnapshot {
                    price: FALLBACK_PRICE,
                    volume_24h: FALLBACK_VOLUME_24H,
                    price_change_24h: FALLBACK_CHANGE_24H,
                    market_cap: FALLBACK_MARKET_CAP,
                    timestamp: now(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub async fn order_book(&self) -> OrderBook {
        let snapshot = self.market_data().await;
        let mut rng = StdRng::from_entropy();
        analytics::synthesize_order_book(snapshot.price, &mut rng, now())
    }

    pub async fn market_analysis(&self) -> MarketAnalysis {
        let snapshot = self.market_data().await;
        let mut rng = StdRng::from_entropy();
        let book = analytics::synthesize_order_book(snapshot.price, &mut rng, now());
        analytics::analyze(&snapshot, &book, now())
    }

    pub async fn trend(&self) -> TrendReport {
        let snapshot = self.market_data().await;
        TrendReport {
            trend: analytics::analyze_trend(&snapshot),
            timestamp: now(),
        }
    }

    pub async fn volatility(&self) -> VolatilityReport {
        let snapshot = self.market_data().await;
        VolatilityReport {
            volatility: analytics::calculate_volatility(&snapshot),
            timestamp: now(),
        }
    }

    pub async fn sentiment(&self) -> SentimentReport {
        let snapshot = self.market_data().await;
        SentimentReport {
            sentiment: analytics::analyze_sentiment(&snapshot),
            timestamp: now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::market::PriceQuote;
    use crate::domains::testing::{FeedBehavior, MockFeed};

    #[tokio::test]
    async fn test_live_snapshot() {
        let feed = Arc::new(MockFeed::new(FeedBehavior::Quote(PriceQuote {
            price_usd: 8.0,
            price_change_24h: -3.0,
            volume_24h: 1.0e6,
            market_cap: 2.0e9,
        })));
        let client = MarketClient::new(feed.clone(), Duration::from_secs(5));
        let snapshot = client.market_data().await;
        assert_eq!(snapshot.price, 8.0);
        assert!(snapshot.error.is_none());
        assert_eq!(client.trend().await.trend, Trend::Bearish);
        assert_eq!(feed.calls(), 2);
    }

    #[tokio::test]
    async fn test_feed_failure_serves_fallback() {
        let client = MarketClient::new(Arc::new(MockFeed::new(FeedBehavior::Fail)), Duration::from_secs(5));
        let snapshot = client.market_data().await;
        assert_eq!(snapshot.price, FALLBACK_PRICE);
        assert_eq!(snapshot.volume_24h, FALLBACK_VOLUME_24H);
        assert_eq!(snapshot.price_change_24h, FALLBACK_CHANGE_24H);
        assert_eq!(snapshot.market_cap, FALLBACK_MARKET_CAP);
        assert_eq!(snapshot.error.as_deref(), Some("Invalid API response"));
    }

    #[tokio::test]
    async fn test_zero_price_serves_fallback_with_ordered_book() {
        let feed = Arc::new(MockFeed::new(FeedBehavior::Quote(PriceQuote {
            price_usd: 0.0,
            price_change_24h: 0.0,
            volume_24h: 0.0,
            market_cap: 0.0,
        })));
        let client = MarketClient::new(feed, Duration::from_secs(5));
        let snapshot = client.market_data().await;
        assert_eq!(snapshot.price, FALLBACK_PRICE);
        assert_eq!(snapshot.error.as_deref(), Some("Invalid API response"));

        let book = client.order_book().await;
        let bids: Vec<f64> = book.bids.iter().map(|l| l.price).collect();
        let asks: Vec<f64> = book.asks.iter().map(|l| l.price).collect();
        assert!(bids.windows(2).all(|w| w[0] > w[1]));
        assert!(asks.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_feed_times_out_to_fallback() {
        let client = MarketClient::new(Arc::new(MockFeed::new(FeedBehavior::Hang)), Duration::from_secs(5));
        let snapshot = client.market_data().await;
        assert_eq!(snapshot.price, FALLBACK_PRICE);
        assert!(snapshot.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_analysis_on_fallback_is_bullish() {
        let client = MarketClient::new(Arc::new(MockFeed::new(FeedBehavior::Fail)), Duration::from_secs(5));
        let analysis = client.market_analysis().await;
        assert_eq!(analysis.trend, Trend::Bullish);
        assert_eq!(analysis.market_sentiment, Sentiment::Positive);
        assert_eq!(analysis.support_levels.len(), 3);
        assert!(analysis.liquidity_analysis.total_depth > 0.0);
    }
}
