//! Vault statistics, APT market data, arbitrage scan and action simulation.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::domains::bounded;
use crate::domains::chain::{
    APTOS_COIN, ChainClient, OCTAS_PER_APT, SHARE_PRICE_SCALE, first_bool, first_u128,
    vault_function,
};
use crate::domains::market::PriceFeed;
use crate::domains::tools::AdapterError;

const SIMULATION_NOTE: &str = "This is a simulation. Actual execution requires transaction signing.";
const FALLBACK_NOTE: &str = "Using fallback data due to API error";
pub const DEFAULT_MIN_PROFIT: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultStats {
    pub total_assets_apt: String,
    pub total_shares: String,
    pub share_price_apt: String,
    pub available_assets_apt: String,
    pub min_deposit_apt: String,
    pub is_paused: bool,
    pub user_shares: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenMarketData {
    pub token_address: String,
    pub price_usd: f64,
    pub price_change_24h: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
    pub highest_bid: f64,
    pub lowest_ask: f64,
    pub spread_percentage: f64,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageOpportunity {
    pub dex_pair: &'static str,
    pub price_difference: f64,
    pub potential_profit_apt: f64,
    pub volume_available: u32,
    pub execution_complexity: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageReport {
    pub min_profit_threshold: f64,
    pub opportunities: Vec<ArbitrageOpportunity>,
    pub total_opportunities: usize,
    pub timestamp: String,
}

const OPPORTUNITIES: [ArbitrageOpportunity; 2] = [
    ArbitrageOpportunity {
        dex_pair: "PancakeSwap APT/USDC vs Thala APT/USDC",
        price_difference: 0.15,
        potential_profit_apt: 0.05,
        volume_available: 100,
        execution_complexity: "medium",
    },
    ArbitrageOpportunity {
        dex_pair: "Liquidswap APT/BTC vs Aries APT/BTC",
        price_difference: 0.08,
        potential_profit_apt: 0.02,
        volume_available: 50,
        execution_complexity: "high",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultAction {
    Deposit,
    Withdraw,
    Allocate,
    ReturnFunds,
}

impl FromStr for VaultAction {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "withdraw" => Ok(Self::Withdraw),
            "allocate" => Ok(Self::Allocate),
            "return_funds" => Ok(Self::ReturnFunds),
            other => Err(AdapterError::invalid_argument(format!(
                "Unknown action: {other} (expected deposit, withdraw, allocate or return_funds)"
            ))),
        }
    }
}

fn apt(octas: u128) -> String {
    format!("{:.4}", octas as f64 / OCTAS_PER_APT)
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

pub struct VaultAnalytics {
    chain: Arc<dyn ChainClient>,
    feed: Arc<dyn PriceFeed>,
    vault_address: String,
    timeout: Duration,
}

impl VaultAnalytics {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        feed: Arc<dyn PriceFeed>,
        vault_address: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            chain,
            feed,
            vault_address: vault_address.into(),
            timeout,
        }
    }

    async fn view(&self, function: &str, arguments: Vec<Value>) -> Result<Vec<Value>, AdapterError> {
        let function = vault_function(&self.vault_address, function);
        debug!(function = %function, "Vault view");
        bounded(self.timeout, self.chain.view(&function, arguments)).await
    }

    async fn view_u128(&self, function: &str) -> Result<u128, AdapterError> {
        let values = self.view(function, vec![json!(self.vault_address)]).await?;
        Ok(first_u128(&values)?)
    }

    pub async fn vault_stats(&self, user_address: Option<&str>) -> Result<VaultStats, AdapterError> {
        self.read_stats(user_address)
            .await
            .map_err(|e| AdapterError::external(format!("Failed to get vault stats: {e}")))
    }

    async fn read_stats(&self, user_address: Option<&str>) -> Result<VaultStats, AdapterError> {
        let paused = async {
            let values = self.view("is_paused", vec![json!(self.vault_address)]).await?;
            Ok::<_, AdapterError>(first_bool(&values)?)
        };
        let (total_assets, total_shares, share_price, available, min_deposit, is_paused) = tokio::try_join!(
            self.view_u128("get_total_assets"),
            self.view_u128("get_total_shares"),
            self.view_u128("get_share_price"),
            self.view_u128("get_available_assets"),
            self.view_u128("get_min_deposit"),
            paused,
        )?;

        let user_shares = match user_address {
            Some(user) => {
                let values = self
                    .view("get_user_shares", vec![json!(self.vault_address), json!(user)])
                    .await?;
                Some(apt(first_u128(&values)?))
            }
            None => None,
        };

        Ok(VaultStats {
            total_assets_apt: apt(total_assets),
            total_shares: apt(total_shares),
            share_price_apt: format!("{:.6}", share_price as f64 / SHARE_PRICE_SCALE),
            available_assets_apt: apt(available),
            min_deposit_apt: apt(min_deposit),
            is_paused,
            user_shares,
            timestamp: now(),
        })
    }

    /// Quote with synthetic top of book; the fallback document on feed failure.
    pub async fn market_data(&self, token_address: Option<&str>) -> TokenMarketData {
        let token_address = token_address.unwrap_or(APTOS_COIN).to_string();
        let quote = async { self.feed.fetch_price().await.and_then(|q| q.validated()) };
        match bounded(self.timeout, quote).await {
            Ok(quote) => TokenMarketData {
                token_address,
                price_usd: quote.price_usd,
                price_change_24h: quote.price_change_24h,
                volume_24h: quote.volume_24h,
                market_cap: quote.market_cap,
                highest_bid: quote.price_usd * 0.999,
                lowest_ask: quote.price_usd * 1.001,
                spread_percentage: 0.2,
                timestamp: now(),
                note: None,
            },
            Err(e) => {
                warn!("Price feed unavailable, serving fallback: {}", e);
                TokenMarketData {
                    token_address,
                    price_usd: 12.50,
                    price_change_24h: 2.5,
                    volume_24h: 150_000_000.0,
                    market_cap: 5_000_000_000.0,
                    highest_bid: 12.49,
                    lowest_ask: 12.51,
                    spread_percentage: 0.16,
                    timestamp: now(),
                    note: Some(FALLBACK_NOTE),
                }
            }
        }
    }

    pub fn arbitrage_opportunities(&self, min_profit_threshold: Option<f64>) -> ArbitrageReport {
        let threshold = min_profit_threshold.unwrap_or(DEFAULT_MIN_PROFIT);
        let opportunities: Vec<_> = OPPORTUNITIES
            .iter()
            .filter(|op| op.potential_profit_apt >= threshold)
            .cloned()
            .collect();
        ArbitrageReport {
            min_profit_threshold: threshold,
            total_opportunities: opportunities.len(),
            opportunities,
            timestamp: now(),
        }
    }

    /// Simulated outcome of a vault action; nothing is submitted.
    pub fn simulate_action(
        &self,
        action: &str,
        amount: Option<&str>,
        recipient: Option<&str>,
    ) -> Result<Value, AdapterError> {
        let action: VaultAction = action.parse()?;
        let mut doc = Map::new();
        let mut put = |key: &str, value: Value| {
            doc.insert(key.to_string(), value);
        };

        match action {
            VaultAction::Deposit => {
                let estimated = match amount {
                    Some(raw) => {
                        let apt: f64 = raw.trim().parse().map_err(|_| {
                            AdapterError::invalid_argument(format!("amount is not a number: {raw}"))
                        })?;
                        format!("{:.4}", apt * 0.99)
                    }
                    None => "0".to_string(),
                };
                put("action", json!("deposit"));
                if let Some(amount) = amount {
                    put("amount_apt", json!(amount));
                }
                put("estimated_shares", json!(estimated));
                put("gas_estimate", json!("0.001"));
                put("success_probability", json!("95%"));
            }
            VaultAction::Withdraw => {
                put("action", json!("withdraw"));
                put("estimated_apt", json!(amount.unwrap_or("all_shares")));
                put("withdrawal_fee", json!("0.1%"));
                put("gas_estimate", json!("0.0015"));
                put("success_probability", json!("98%"));
            }
            VaultAction::Allocate => {
                put("action", json!("allocate_funds"));
                if let Some(amount) = amount {
                    put("amount_apt", json!(amount));
                }
                if let Some(recipient) = recipient {
                    put("recipient", json!(recipient));
                }
                put("gas_estimate", json!("0.002"));
                put("success_probability", json!("90%"));
            }
            VaultAction::ReturnFunds => {
                put("action", json!("return_funds"));
                if let Some(amount) = amount {
                    put("amount_apt", json!(amount));
                }
                put("gas_estimate", json!("0.0018"));
                put("success_probability", json!("95%"));
            }
        }

        put("timestamp", json!(now()));
        put("note", json!(SIMULATION_NOTE));
        Ok(Value::Object(doc))
    }
}
