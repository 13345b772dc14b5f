//! Market-data domain: price feed, derived analytics and the market manager.

pub mod analytics;
mod client;
mod feed;
mod manager;

pub use analytics::{BookLevel, Liquidity, MarketAnalysis, MarketSnapshot, OrderBook, Sentiment, Trend};
pub use client::{MarketClient, SentimentReport, TrendReport, VolatilityReport};
pub use feed::{CoinGeckoFeed, FeedError, PriceFeed, PriceQuote};
pub use manager::{HYPERFILL_MARKET, MarketListing, MarketManager};
