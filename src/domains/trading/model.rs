//! Trading data model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::order::OrderState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpenOrderStatus {
    Active,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub symbol: String,
    pub index_token: String,
    pub name: String,
    pub precision: u8,
    pub min_trade_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrder {
    pub order_id: String,
    pub asset: String,
    pub side: OrderSide,
    pub price: String,
    pub size: f64,
    pub filled: f64,
    pub status: OpenOrderStatus,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub asset: String,
    pub size: f64,
    pub entry_price: String,
    pub mark_price: String,
    pub pnl: f64,
    pub side: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub trade_id: String,
    pub order_id: String,
    pub asset: String,
    pub side: OrderSide,
    pub price: String,
    pub size: f64,
    pub fee: f64,
    pub timestamp: String,
}

/// Result of one external call: `{success, result}` or `{success, error}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallOutcome {
    pub fn success(result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Answer to an order placement; the id is set even when the call failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub response: CallOutcome,
    pub order_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtectiveOrder {
    pub success: bool,
    pub message: &'static str,
    pub price: String,
    pub size: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderKind {
    Limit,
    Market,
    Close,
}

/// An order this process submitted, with its lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedOrder {
    pub order_id: String,
    pub kind: OrderKind,
    pub asset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_buy: Option<bool>,
    pub size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leverage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slippage: Option<f64>,
    pub reduce_only: bool,
    pub status: OrderState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownOrder {
    pub order_id: String,
    pub status: &'static str,
}

/// One entry of `get_order_status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OrderStatusEntry {
    Open(OpenOrder),
    Submitted(SubmittedOrder),
    NotFound(UnknownOrder),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub success: bool,
    pub timestamp: String,
    pub last_update_time: i64,
    /// APT balance read during this refresh.
    pub balance: f64,
}
