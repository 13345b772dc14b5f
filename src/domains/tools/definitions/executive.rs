//! Executive server tools: order placement and position management.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;

use crate::domains::tools::{AdapterError, ToolError, ToolRegistry};
use crate::domains::trading::AptosTrader;

// ============================================================================
// Tool Parameters
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceLimitOrderParams {
    /// Asset symbol (e.g. "APT").
    pub asset: String,
    /// True for a buy order, false for a sell order.
    pub is_buy: bool,
    /// Limit price.
    pub price: String,
    /// Order size in APT.
    pub size: f64,
    /// Leverage multiplier (defaults to the configured leverage).
    #[serde(default)]
    pub leverage: Option<f64>,
    /// Only reduce an existing position.
    #[serde(default)]
    pub reduce_only: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceMarketOrderParams {
    /// Asset symbol (e.g. "APT").
    pub asset: String,
    /// True for a buy order, false for a sell order.
    pub is_buy: bool,
    /// Order size in APT.
    pub size: f64,
    /// Leverage multiplier (defaults to the configured leverage).
    #[serde(default)]
    pub leverage: Option<f64>,
    /// Maximum slippage in percent (defaults to the configured slippage).
    #[serde(default)]
    pub slippage: Option<f64>,
    /// Only reduce an existing position.
    #[serde(default)]
    pub reduce_only: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderParams {
    /// Id of the order to cancel.
    pub order_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClosePositionParams {
    /// Asset symbol of the position.
    pub asset: String,
    /// Price at which to close.
    pub close_price: String,
    /// Quantity to close in APT (defaults to 1.0).
    #[serde(default)]
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollateralParams {
    /// Asset symbol of the position.
    pub asset: String,
    /// Collateral amount in APT.
    pub collateral: f64,
    /// Side of the position.
    pub is_buy: bool,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TakeProfitParams {
    /// Asset symbol of the position.
    pub asset: String,
    /// Trigger price.
    pub take_profit_price: String,
    /// Size to close at the trigger.
    pub size: String,
    /// Side of the position.
    pub is_buy: bool,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopLossParams {
    /// Asset symbol of the position.
    pub asset: String,
    /// Trigger price.
    pub stop_loss_price: String,
    /// Size to close at the trigger.
    pub size: String,
    /// Side of the position.
    pub is_buy: bool,
}

// ============================================================================
// Tool Names
// ============================================================================

pub const PLACE_LIMIT_ORDER: &str = "place_limit_order";
pub const PLACE_MARKET_ORDER: &str = "place_market_order";
pub const CANCEL_ORDER: &str = "cancel_order";
pub const CLOSE_POSITION: &str = "close_position";
pub const ADD_COLLATERAL: &str = "add_collateral";
pub const REMOVE_COLLATERAL: &str = "remove_collateral";
pub const SET_TAKE_PROFIT: &str = "set_take_profit";
pub const SET_STOP_LOSS: &str = "set_stop_loss";

// ============================================================================
// Registry
// ============================================================================

pub fn registry() -> Result<ToolRegistry<AptosTrader>, ToolError> {
    ToolRegistry::builder()
        .tool(
            PLACE_LIMIT_ORDER,
            "Place a limit order for a specific asset",
            |t: Arc<AptosTrader>, p: PlaceLimitOrderParams| async move {
                t.place_limit_order(
                    &p.asset,
                    p.is_buy,
                    &p.price,
                    p.size,
                    p.leverage,
                    p.reduce_only.unwrap_or(false),
                )
                .await
            },
        )
        .tool(
            PLACE_MARKET_ORDER,
            "Place a market order for a specific asset",
            |t: Arc<AptosTrader>, p: PlaceMarketOrderParams| async move {
                t.place_market_order(
                    &p.asset,
                    p.is_buy,
                    p.size,
                    p.leverage,
                    p.slippage,
                    p.reduce_only.unwrap_or(false),
                )
                .await
            },
        )
        .tool(
            CANCEL_ORDER,
            "Cancel an existing order",
            |t: Arc<AptosTrader>, p: CancelOrderParams| async move {
                Ok::<_, AdapterError>(t.cancel_order(&p.order_id).await)
            },
        )
        .tool(
            CLOSE_POSITION,
            "Close an existing position",
            |t: Arc<AptosTrader>, p: ClosePositionParams| async move {
                t.close_position(&p.asset, &p.close_price, p.quantity).await
            },
        )
        .tool(
            ADD_COLLATERAL,
            "Add collateral to a position",
            |t: Arc<AptosTrader>, p: CollateralParams| async move {
                t.add_collateral(&p.asset, p.collateral, p.is_buy).await
            },
        )
        .tool(
            REMOVE_COLLATERAL,
            "Remove collateral from a position",
            |t: Arc<AptosTrader>, p: CollateralParams| async move {
                t.remove_collateral(&p.asset, p.collateral, p.is_buy).await
            },
        )
        .tool(
            SET_TAKE_PROFIT,
            "Set take profit for a position",
            |t: Arc<AptosTrader>, p: TakeProfitParams| async move {
                Ok::<_, AdapterError>(t.set_take_profit(&p.asset, &p.take_profit_price, &p.size, p.is_buy))
            },
        )
        .tool(
            SET_STOP_LOSS,
            "Set stop loss for a position",
            |t: Arc<AptosTrader>, p: StopLossParams| async move {
                Ok::<_, AdapterError>(t.set_stop_loss(&p.asset, &p.stop_loss_price, &p.size, p.is_buy))
            },
        )
        .build()
}
