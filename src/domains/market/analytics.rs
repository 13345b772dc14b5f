//! Derived market metrics.
//!
//! All functions here are pure; order-book synthesis takes its randomness
//! from the caller's `Rng`.

use rand::Rng;
use serde::{Serialize, Serializer, ser::SerializeTuple};

/// 24h market snapshot of one market.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub price: f64,
    pub volume_24h: f64,
    pub price_change_24h: f64,
    pub market_cap: f64,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    VeryPositive,
    Positive,
    Neutral,
    Negative,
    VeryNegative,
}

/// One price level; serialized as `["price", "volume"]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookLevel {
    pub price: f64,
    pub volume: f64,
}

impl Serialize for BookLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&format!("{:.4}", self.price))?;
        tuple.serialize_element(&format!("{:.2}", self.volume))?;
        tuple.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBook {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Liquidity {
    pub bid_depth: f64,
    pub ask_depth: f64,
    pub total_depth: f64,
    pub imbalance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketAnalysis {
    pub trend: Trend,
    pub volatility: f64,
    pub momentum: f64,
    pub support_levels: Vec<f64>,
    pub resistance_levels: Vec<f64>,
    pub market_sentiment: Sentiment,
    pub liquidity_analysis: Liquidity,
    pub timestamp: String,
}

const SPREAD_PERCENT: f64 = 0.5;
const BOOK_LEVELS: usize = 5;
const LEVEL_STEP: f64 = 0.001;

pub fn analyze_trend(snapshot: &MarketSnapshot) -> Trend {
    let change = snapshot.price_change_24h;
    if change > 2.0 {
        Trend::Bullish
    } else if change < -2.0 {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

pub fn calculate_volatility(snapshot: &MarketSnapshot) -> f64 {
    snapshot.price_change_24h.abs() / 100.0
}

pub fn calculate_momentum(snapshot: &MarketSnapshot) -> f64 {
    snapshot.price_change_24h / 100.0
}

pub fn support_levels(snapshot: &MarketSnapshot) -> Vec<f64> {
    [0.95, 0.90, 0.85].iter().map(|f| snapshot.price * f).collect()
}

pub fn resistance_levels(snapshot: &MarketSnapshot) -> Vec<f64> {
    [1.05, 1.10, 1.15].iter().map(|f| snapshot.price * f).collect()
}

pub fn analyze_sentiment(snapshot: &MarketSnapshot) -> Sentiment {
    let change = snapshot.price_change_24h;
    if change > 5.0 {
        Sentiment::VeryPositive
    } else if change > 2.0 {
        Sentiment::Positive
    } else if change < -5.0 {
        Sentiment::VeryNegative
    } else if change < -2.0 {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

pub fn analyze_liquidity(book: &OrderBook) -> Liquidity {
    let depth = |levels: &[BookLevel]| levels.iter().map(|l| l.price * l.volume).sum::<f64>();
    let bid_depth = depth(&book.bids);
    let ask_depth = depth(&book.asks);
    let total_depth = bid_depth + ask_depth;
    let imbalance = if total_depth == 0.0 {
        0.0
    } else {
        (bid_depth - ask_depth) / total_depth
    };
    Liquidity {
        bid_depth,
        ask_depth,
        total_depth,
        imbalance,
    }
}

/// Build a five-level book around `price`.
///
/// Bids are strictly descending and asks strictly ascending for any positive
/// price; each level's volume is drawn uniformly from `[0.1, 10)`.
pub fn synthesize_order_book<R: Rng>(price: f64, rng: &mut R, timestamp: String) -> OrderBook {
    let bid = price * (1.0 - SPREAD_PERCENT / 100.0);
    let ask = price * (1.0 + SPREAD_PERCENT / 100.0);

    let mut bids = Vec::with_capacity(BOOK_LEVELS);
    let mut asks = Vec::with_capacity(BOOK_LEVELS);
    for i in 0..BOOK_LEVELS {
        let step = LEVEL_STEP * i as f64;
        let volume = rng.gen_range(0.1..10.0);
        bids.push(BookLevel {
            price: bid * (1.0 - step),
            volume,
        });
        asks.push(BookLevel {
            price: ask * (1.0 + step),
            volume,
        });
    }

    bids.sort_by(|a, b| b.price.total_cmp(&a.price));
    asks.sort_by(|a, b| a.price.total_cmp(&b.price));

    OrderBook {
        bids,
        asks,
        timestamp,
    }
}

/// Full analysis of a snapshot and its book.
pub fn analyze(snapshot: &MarketSnapshot, book: &OrderBook, timestamp: String) -> MarketAnalysis {
    MarketAnalysis {
        trend: analyze_trend(snapshot),
        volatility: calculate_volatility(snapshot),
        momentum: calculate_momentum(snapshot),
        support_levels: support_levels(snapshot),
        resistance_levels: resistance_levels(snapshot),
        market_sentiment: analyze_sentiment(snapshot),
        liquidity_analysis: analyze_liquidity(book),
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use serde_json::json;

    fn snapshot(change: f64) -> MarketSnapshot {
        MarketSnapshot {
            price: 10.0,
            volume_24h: 1.0,
            price_change_24h: change,
            market_cap: 1.0,
            timestamp: "t".to_string(),
            error: None,
        }
    }

    #[test]
    fn test_trend_thresholds() {
        assert_eq!(analyze_trend(&snapshot(3.0)), Trend::Bullish);
        assert_eq!(analyze_trend(&snapshot(-3.0)), Trend::Bearish);
        assert_eq!(analyze_trend(&snapshot(0.5)), Trend::Neutral);
        assert_eq!(analyze_trend(&snapshot(2.0)), Trend::Neutral);
    }

    #[test]
    fn test_sentiment_thresholds() {
        assert_eq!(analyze_sentiment(&snapshot(6.0)), Sentiment::VeryPositive);
        assert_eq!(analyze_sentiment(&snapshot(3.0)), Sentiment::Positive);
        assert_eq!(analyze_sentiment(&snapshot(0.0)), Sentiment::Neutral);
        assert_eq!(analyze_sentiment(&snapshot(-3.0)), Sentiment::Negative);
        assert_eq!(analyze_sentiment(&snapshot(-6.0)), Sentiment::VeryNegative);
        assert_eq!(serde_json::to_value(Sentiment::VeryNegative).unwrap(), json!("very_negative"));
    }

    #[test]
    fn test_volatility_and_momentum() {
        let s = snapshot(-2.5);
        assert_eq!(calculate_volatility(&s), 0.025);
        assert_eq!(calculate_momentum(&s), -0.025);
    }

    #[test]
    fn test_support_and_resistance() {
        let s = snapshot(0.0);
        let support = support_levels(&s);
        let resistance = resistance_levels(&s);
        assert!((support[0] - 9.5).abs() < 1e-9);
        assert!((support[2] - 8.5).abs() < 1e-9);
        assert!((resistance[1] - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_order_book_is_sorted_for_any_seed() {
        for seed in 0..200u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let book = synthesize_order_book(12.5, &mut rng, String::new());
            assert_eq!(book.bids.len(), 5);
            assert_eq!(book.asks.len(), 5);
            assert!(book.bids.windows(2).all(|w| w[0].price > w[1].price));
            assert!(book.asks.windows(2).all(|w| w[0].price < w[1].price));
            assert!(book.bids[0].price < book.asks[0].price);
            assert!(
                book.bids
                    .iter()
                    .chain(&book.asks)
                    .all(|l| (0.1..10.0).contains(&l.volume))
            );
        }
    }

    #[test]
    fn test_book_level_wire_format() {
        let level = BookLevel {
            price: 12.4375,
            volume: 3.14159,
        };
        assert_eq!(serde_json::to_value(level).unwrap(), json!(["12.4375", "3.14"]));
    }

    #[test]
    fn test_liquidity_of_empty_book_has_zero_imbalance() {
        let book = OrderBook {
            bids: vec![],
            asks: vec![],
            timestamp: String::new(),
        };
        let liquidity = analyze_liquidity(&book);
        assert_eq!(liquidity.total_depth, 0.0);
        assert_eq!(liquidity.imbalance, 0.0);
    }

    #[test]
    fn test_liquidity_imbalance() {
        let book = OrderBook {
            bids: vec![BookLevel { price: 10.0, volume: 3.0 }],
            asks: vec![BookLevel { price: 10.0, volume: 1.0 }],
            timestamp: String::new(),
        };
        let liquidity = analyze_liquidity(&book);
        assert_eq!(liquidity.bid_depth, 30.0);
        assert_eq!(liquidity.ask_depth, 10.0);
        assert_eq!(liquidity.imbalance, 0.5);
    }
}
