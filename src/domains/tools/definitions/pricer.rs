//! Pricer server tools: portfolio reads over the shared trading adapter.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;

use super::EmptyParams;
use crate::domains::tools::{AdapterError, ToolError, ToolRegistry};
use crate::domains::trading::{AptosTrader, OrderSide};

// ============================================================================
// Tool Parameters
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchOpenOrdersParams {
    /// Asset symbol to filter by.
    #[serde(default)]
    pub asset: Option<String>,
    /// Order side, "BUY" or "SELL".
    #[serde(default)]
    pub side: Option<OrderSide>,
    /// Page number, starting at 0.
    #[serde(default)]
    pub page: Option<i64>,
    /// Page size, 1 to 100.
    #[serde(default)]
    pub size: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    /// Page number, starting at 0.
    #[serde(default)]
    pub page: Option<i64>,
    /// Page size, 1 to 100.
    #[serde(default)]
    pub size: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TradeHistoryParams {
    /// Page number, starting at 0.
    #[serde(default)]
    pub page: Option<i64>,
    /// Page size, 1 to 100.
    #[serde(default)]
    pub size: Option<i64>,
    /// Only trades of this order.
    #[serde(default)]
    pub associated_order_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusParams {
    /// Ids of the orders to look up.
    pub order_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SymbolParams {
    /// Asset symbol (e.g. "APT").
    pub symbol: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AssetParams {
    /// Asset symbol (e.g. "APT").
    pub asset: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct OptionalAssetParams {
    /// Asset symbol; any asset when omitted.
    #[serde(default)]
    pub asset: Option<String>,
}

// ============================================================================
// Tool Names
// ============================================================================

pub const FETCH_ASSETS: &str = "fetch_assets";
pub const FETCH_OPEN_ORDERS: &str = "fetch_open_orders";
pub const FETCH_POSITIONS: &str = "fetch_positions";
pub const FETCH_BALANCE: &str = "fetch_balance";
pub const FETCH_TRADE_HISTORY: &str = "fetch_trade_history";
pub const GET_ORDER_STATUS: &str = "get_order_status";
pub const GET_ASSET: &str = "get_asset";
pub const GET_POSITION: &str = "get_position";
pub const HAS_OPEN_POSITION: &str = "has_open_position";
pub const HAS_OPEN_ORDERS: &str = "has_open_orders";
pub const REFRESH_ALL_DATA: &str = "refresh_all_data";

// ============================================================================
// Registry
// ============================================================================

pub fn registry() -> Result<ToolRegistry<AptosTrader>, ToolError> {
    ToolRegistry::builder()
        .tool(
            FETCH_ASSETS,
            "Fetch available trading assets",
            |t: Arc<AptosTrader>, _: EmptyParams| async move {
                Ok::<_, AdapterError>(t.fetch_assets().await)
            },
        )
        .tool(
            FETCH_OPEN_ORDERS,
            "Fetch open orders for a specific asset",
            |t: Arc<AptosTrader>, p: FetchOpenOrdersParams| async move {
                Ok::<_, AdapterError>(
                    t.fetch_open_orders(p.asset.as_deref(), p.side, p.page, p.size)
                        .await,
                )
            },
        )
        .tool(
            FETCH_POSITIONS,
            "Fetch current trading positions",
            |t: Arc<AptosTrader>, p: PageParams| async move {
                Ok::<_, AdapterError>(t.fetch_positions(p.page, p.size).await)
            },
        )
        .tool(
            FETCH_BALANCE,
            "Fetch account balance",
            |t: Arc<AptosTrader>, _: EmptyParams| async move {
                Ok::<_, AdapterError>(t.fetch_balance().await)
            },
        )
        .tool(
            FETCH_TRADE_HISTORY,
            "Fetch trade history",
            |t: Arc<AptosTrader>, p: TradeHistoryParams| async move {
                Ok::<_, AdapterError>(
                    t.fetch_trade_history(p.page, p.size, p.associated_order_id.as_deref())
                        .await,
                )
            },
        )
        .tool(
            GET_ORDER_STATUS,
            "Get status of specific orders",
            |t: Arc<AptosTrader>, p: OrderStatusParams| async move {
                Ok::<_, AdapterError>(t.get_order_status(&p.order_ids).await)
            },
        )
        .tool(
            GET_ASSET,
            "Get asset information by symbol",
            |t: Arc<AptosTrader>, p: SymbolParams| async move { t.get_asset(&p.symbol).await },
        )
        .tool(
            GET_POSITION,
            "Get position information for an asset",
            |t: Arc<AptosTrader>, p: AssetParams| async move { t.get_position(&p.asset).await },
        )
        .tool(
            HAS_OPEN_POSITION,
            "Check if there's an open position for an asset",
            |t: Arc<AptosTrader>, p: AssetParams| async move {
                Ok::<_, AdapterError>(t.has_open_position(&p.asset).await)
            },
        )
        .tool(
            HAS_OPEN_ORDERS,
            "Check if there are open orders",
            |t: Arc<AptosTrader>, p: OptionalAssetParams| async move {
                Ok::<_, AdapterError>(t.has_open_orders(p.asset.as_deref()).await)
            },
        )
        .tool(
            REFRESH_ALL_DATA,
            "Refresh all portfolio data",
            |t: Arc<AptosTrader>, _: EmptyParams| async move {
                Ok::<_, AdapterError>(t.refresh_all_data().await)
            },
        )
        .build()
}
