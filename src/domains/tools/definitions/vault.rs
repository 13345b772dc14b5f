//! Vault server tools.
//!
//! Argument names are snake_case, as published by the stand-alone vault server.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;

use crate::domains::tools::{AdapterError, ToolError, ToolRegistry};
use crate::domains::vault::VaultAnalytics;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct VaultStatsParams {
    /// User address to get specific stats for (optional).
    #[serde(default)]
    pub user_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TokenParams {
    /// Token address to get price for.
    #[serde(default)]
    pub token_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ArbitrageParams {
    /// Minimum profit threshold in APT (default 0.01).
    #[serde(default)]
    pub min_profit_threshold: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct VaultActionParams {
    /// Action to execute: deposit, withdraw, allocate or return_funds.
    pub action: String,
    /// Amount in APT (for relevant actions).
    #[serde(default)]
    pub amount: Option<String>,
    /// Recipient address (for allocate action).
    #[serde(default)]
    pub recipient: Option<String>,
}

pub const GET_VAULT_STATS: &str = "get_vault_stats";
pub const GET_MARKET_DATA: &str = "get_market_data";
pub const CHECK_ARBITRAGE_OPPORTUNITIES: &str = "check_arbitrage_opportunities";
pub const EXECUTE_VAULT_ACTION: &str = "execute_vault_action";

pub fn registry() -> Result<ToolRegistry<VaultAnalytics>, ToolError> {
    ToolRegistry::builder()
        .tool(
            GET_VAULT_STATS,
            "Get current vault statistics including total assets, shares, and user balances",
            |v: Arc<VaultAnalytics>, p: VaultStatsParams| async move {
                v.vault_stats(p.user_address.as_deref()).await
            },
        )
        .tool(
            GET_MARKET_DATA,
            "Get current market data for APT and other tokens",
            |v: Arc<VaultAnalytics>, p: TokenParams| async move {
                Ok::<_, AdapterError>(v.market_data(p.token_address.as_deref()).await)
            },
        )
        .tool(
            CHECK_ARBITRAGE_OPPORTUNITIES,
            "Check for arbitrage opportunities across different DEXs",
            |v: Arc<VaultAnalytics>, p: ArbitrageParams| async move {
                Ok::<_, AdapterError>(v.arbitrage_opportunities(p.min_profit_threshold))
            },
        )
        .tool(
            EXECUTE_VAULT_ACTION,
            "Execute actions on the vault (deposit, withdraw, allocate funds)",
            |v: Arc<VaultAnalytics>, p: VaultActionParams| async move {
                v.simulate_action(&p.action, p.amount.as_deref(), p.recipient.as_deref())
            },
        )
        .build()
}
