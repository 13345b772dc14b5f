//! Market analyzer server tools.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;

use super::EmptyParams;
use crate::domains::market::MarketManager;
use crate::domains::tools::{AdapterError, ToolError, ToolRegistry};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketNameParams {
    /// Market name as returned by get_market_list (e.g. "hyperfill").
    pub market_name: String,
}

pub const GET_MARKET_LIST: &str = "get_market_list";
pub const GET_MARKET_DATA: &str = "get_market_data";
pub const GET_ORDER_BOOK: &str = "get_order_book";
pub const GET_MARKET_ANALYSIS: &str = "get_market_analysis";
pub const ANALYZE_TREND: &str = "analyze_trend";
pub const CALCULATE_VOLATILITY: &str = "calculate_volatility";
pub const ANALYZE_SENTIMENT: &str = "analyze_sentiment";

pub fn registry() -> Result<ToolRegistry<MarketManager>, ToolError> {
    ToolRegistry::builder()
        .tool(
            GET_MARKET_LIST,
            "Get list of available markets",
            |m: Arc<MarketManager>, _: EmptyParams| async move {
                Ok::<_, AdapterError>(m.market_list())
            },
        )
        .tool(
            GET_MARKET_DATA,
            "Get real-time market data for a specific market",
            |m: Arc<MarketManager>, p: MarketNameParams| async move {
                m.market_data(&p.market_name).await
            },
        )
        .tool(
            GET_ORDER_BOOK,
            "Get order book data for a specific market",
            |m: Arc<MarketManager>, p: MarketNameParams| async move {
                m.order_book(&p.market_name).await
            },
        )
        .tool(
            GET_MARKET_ANALYSIS,
            "Get comprehensive market analysis including trends, volatility, and sentiment",
            |m: Arc<MarketManager>, p: MarketNameParams| async move {
                m.market_analysis(&p.market_name).await
            },
        )
        .tool(
            ANALYZE_TREND,
            "Analyze market trend for a specific market",
            |m: Arc<MarketManager>, p: MarketNameParams| async move { m.trend(&p.market_name).await },
        )
        .tool(
            CALCULATE_VOLATILITY,
            "Calculate market volatility metrics",
            |m: Arc<MarketManager>, p: MarketNameParams| async move {
                m.volatility(&p.market_name).await
            },
        )
        .tool(
            ANALYZE_SENTIMENT,
            "Analyze market sentiment indicators",
            |m: Arc<MarketManager>, p: MarketNameParams| async move {
                m.sentiment(&p.market_name).await
            },
        )
        .build()
}
