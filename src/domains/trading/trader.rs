//! Aptos trading adapter.
//!
//! Order placement and collateral changes are vault `view` calls. Their
//! outcome is reported inside the result document, so a failed chain call
//! still answers with a traceable order id.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::cache::PortfolioCache;
use super::model::{
    Asset, CallOutcome, OpenOrder, OpenOrderStatus, OrderKind, OrderReceipt, OrderSide,
    OrderStatusEntry, Position, ProtectiveOrder, RefreshSummary, Trade, UnknownOrder,
};
use super::order::{OrderDraft, new_order_id};
use crate::core::config::ChainConfig;
use crate::domains::bounded;
use crate::domains::chain::{
    APTOS_COIN, ChainClient, ChainError, OCTAS_PER_APT, as_u128, first_u128, to_octas,
    vault_function,
};
use crate::domains::tools::AdapterError;

const COIN_STORE: &str = "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>";
const MAX_PAGE_SIZE: i64 = 100;

/// Clamp paging arguments to `page >= 0` and `1 <= size <= 100`.
pub fn clamp_paging(page: Option<i64>, size: Option<i64>) -> (usize, usize) {
    let page = page.unwrap_or(0).max(0) as usize;
    let size = size.unwrap_or(10).clamp(1, MAX_PAGE_SIZE) as usize;
    (page, size)
}

fn paginate<T>(items: Vec<T>, page: usize, size: usize) -> Vec<T> {
    items
        .into_iter()
        .skip(page.saturating_mul(size))
        .take(size)
        .collect()
}

fn octas(field: &str, amount: f64) -> Result<String, AdapterError> {
    to_octas(amount).ok_or_else(|| {
        AdapterError::invalid_argument(format!("{field} must be a positive finite number, got {amount}"))
    })
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

pub struct AptosTrader {
    chain: Arc<dyn ChainClient>,
    account: Option<String>,
    vault_address: String,
    default_leverage: f64,
    default_slippage: f64,
    timeout: Duration,
    cache: PortfolioCache,
}

impl AptosTrader {
    pub fn new(chain: Arc<dyn ChainClient>, config: &ChainConfig, timeout: Duration) -> Self {
        Self {
            chain,
            account: config.account.clone(),
            vault_address: config.vault_address.clone(),
            default_leverage: config.default_leverage,
            default_slippage: config.default_slippage,
            timeout,
            cache: PortfolioCache::new(),
        }
    }

    fn account(&self) -> Result<&str, ChainError> {
        self.account.as_deref().ok_or(ChainError::MissingAccount)
    }

    async fn view(&self, function: &str, arguments: Vec<Value>) -> Result<Vec<Value>, AdapterError> {
        let function = vault_function(&self.vault_address, function);
        bounded(self.timeout, self.chain.view(&function, arguments)).await
    }

    /// Run a view and fold the result into a [`CallOutcome`].
    async fn view_outcome(&self, function: &str, arguments: Vec<Value>) -> CallOutcome {
        match self.view(function, arguments).await {
            Ok(values) => CallOutcome::success(Value::Array(values)),
            Err(e) => {
                warn!(function, "Vault call failed: {}", e);
                CallOutcome::failure(e.to_string())
            }
        }
    }

    /// Allocate vault funds for a new order and record its lifecycle.
    async fn submit(&self, draft: OrderDraft, amount: String) -> OrderReceipt {
        let order = draft.create();
        let order_id = order.order_id.clone();

        let response = match self.account() {
            Ok(account) => {
                let arguments = vec![
                    json!(self.vault_address),
                    json!("allocate"),
                    json!(amount),
                    json!(account),
                ];
                self.view_outcome("execute_vault_action", arguments).await
            }
            Err(e) => CallOutcome::failure(e.to_string()),
        };

        let order = order.settle(&response);
        info!(order_id = %order_id, status = ?order.status, "Order submitted");
        self.cache.record_submitted(order).await;

        OrderReceipt { response, order_id }
    }

    pub async fn place_limit_order(
        &self,
        asset: &str,
        is_buy: bool,
        price: &str,
        size: f64,
        leverage: Option<f64>,
        reduce_only: bool,
    ) -> Result<OrderReceipt, AdapterError> {
        let amount = octas("size", size)?;
        let draft = OrderDraft {
            kind: OrderKind::Limit,
            asset: asset.to_string(),
            is_buy: Some(is_buy),
            size,
            price: Some(price.to_string()),
            leverage: Some(leverage.unwrap_or(self.default_leverage)),
            slippage: None,
            reduce_only,
        };
        Ok(self.submit(draft, amount).await)
    }

    pub async fn place_market_order(
        &self,
        asset: &str,
        is_buy: bool,
        size: f64,
        leverage: Option<f64>,
        slippage: Option<f64>,
        reduce_only: bool,
    ) -> Result<OrderReceipt, AdapterError> {
        let amount = octas("size", size)?;
        let draft = OrderDraft {
            kind: OrderKind::Market,
            asset: asset.to_string(),
            is_buy: Some(is_buy),
            size,
            price: None,
            leverage: Some(leverage.unwrap_or(self.default_leverage)),
            slippage: Some(slippage.unwrap_or(self.default_slippage)),
            reduce_only,
        };
        Ok(self.submit(draft, amount).await)
    }

    pub async fn cancel_order(&self, order_id: &str) -> CallOutcome {
        info!(order_id, "Cancelling order");
        self.view_outcome("get_vault_stats", vec![json!(self.vault_address)])
            .await
    }

    pub async fn close_position(
        &self,
        asset: &str,
        close_price: &str,
        quantity: Option<f64>,
    ) -> Result<OrderReceipt, AdapterError> {
        let quantity = quantity.unwrap_or(1.0);
        let amount = octas("quantity", quantity)?;

        let order = OrderDraft {
            kind: OrderKind::Close,
            asset: asset.to_string(),
            is_buy: None,
            size: quantity,
            price: Some(close_price.to_string()),
            leverage: None,
            slippage: None,
            reduce_only: true,
        }
        .create();
        let order_id = order.order_id.clone();

        let response = self
            .view_outcome(
                "execute_vault_action",
                vec![json!(self.vault_address), json!("return_funds"), json!(amount)],
            )
            .await;
        self.cache.record_submitted(order.settle(&response)).await;

        Ok(OrderReceipt { response, order_id })
    }

    pub async fn add_collateral(&self, asset: &str, collateral: f64, is_buy: bool) -> Result<CallOutcome, AdapterError> {
        let amount = octas("collateral", collateral)?;
        info!(asset, is_buy, collateral, "Adding collateral");
        Ok(self
            .view_outcome("deposit_liquidity", vec![json!(self.vault_address), json!(amount)])
            .await)
    }

    pub async fn remove_collateral(
        &self,
        asset: &str,
        collateral: f64,
        is_buy: bool,
    ) -> Result<CallOutcome, AdapterError> {
        octas("collateral", collateral)?;
        info!(asset, is_buy, collateral, "Removing collateral");
        Ok(self
            .view_outcome("withdraw_profits", vec![json!(self.vault_address)])
            .await)
    }

    pub fn set_take_profit(&self, asset: &str, price: &str, size: &str, is_buy: bool) -> ProtectiveOrder {
        info!(asset, price, size, is_buy, "Take profit set");
        ProtectiveOrder {
            success: true,
            message: "Take profit set",
            price: price.to_string(),
            size: size.to_string(),
        }
    }

    pub fn set_stop_loss(&self, asset: &str, price: &str, size: &str, is_buy: bool) -> ProtectiveOrder {
        info!(asset, price, size, is_buy, "Stop loss set");
        ProtectiveOrder {
            success: true,
            message: "Stop loss set",
            price: price.to_string(),
            size: size.to_string(),
        }
    }

    pub async fn fetch_assets(&self) -> Vec<Asset> {
        let assets = vec![Asset {
            symbol: "APT".to_string(),
            index_token: APTOS_COIN.to_string(),
            name: "Aptos".to_string(),
            precision: 8,
            min_trade_size: 0.1,
        }];
        self.cache.put_assets(&assets).await;
        assets
    }

    pub async fn fetch_open_orders(
        &self,
        asset: Option<&str>,
        side: Option<OrderSide>,
        page: Option<i64>,
        size: Option<i64>,
    ) -> Vec<OpenOrder> {
        let (page, size) = clamp_paging(page, size);
        let orders = vec![OpenOrder {
            order_id: new_order_id(),
            asset: asset.unwrap_or("APT").to_string(),
            side: side.unwrap_or(OrderSide::Buy),
            price: "12.50".to_string(),
            size: 1.0,
            filled: 0.0,
            status: OpenOrderStatus::Active,
            timestamp: now(),
        }];
        let orders = paginate(orders, page, size);
        self.cache.put_open_orders(&orders).await;
        orders
    }

    /// Positions from the account's vault shares; `[]` when the chain is unavailable.
    pub async fn fetch_positions(&self, page: Option<i64>, size: Option<i64>) -> Vec<Position> {
        let (page, size) = clamp_paging(page, size);

        let shares = match self.account() {
            Ok(account) => {
                self.view(
                    "get_user_shares",
                    vec![json!(self.vault_address), json!(account)],
                )
                .await
                .and_then(|values| first_u128(&values).map_err(AdapterError::from))
            }
            Err(e) => Err(e.into()),
        };

        let shares = match shares {
            Ok(shares) => shares,
            Err(e) => {
                warn!("Could not fetch positions: {}", e);
                return Vec::new();
            }
        };

        let positions = paginate(
            vec![Position {
                asset: "APT".to_string(),
                size: shares as f64 / OCTAS_PER_APT,
                entry_price: "12.00".to_string(),
                mark_price: "12.50".to_string(),
                pnl: 0.5,
                side: "LONG".to_string(),
                timestamp: now(),
            }],
            page,
            size,
        );
        self.cache.put_positions(&positions).await;
        positions
    }

    /// APT balance of the trading account; 0 when unavailable.
    pub async fn fetch_balance(&self) -> f64 {
        let resource = match self.account() {
            Ok(account) => bounded(self.timeout, self.chain.account_resource(account, COIN_STORE)).await,
            Err(e) => Err(e.into()),
        };

        let value = resource.and_then(|data| {
            as_u128(&data["coin"]["value"]).ok_or_else(|| {
                AdapterError::external("CoinStore resource without coin.value")
            })
        });

        match value {
            Ok(octas) => {
                let balance = octas as f64 / OCTAS_PER_APT;
                self.cache.set_balance(balance).await;
                balance
            }
            Err(e) => {
                warn!("Could not fetch balance: {}", e);
                0.0
            }
        }
    }

    pub async fn fetch_trade_history(
        &self,
        page: Option<i64>,
        size: Option<i64>,
        associated_order_id: Option<&str>,
    ) -> Vec<Trade> {
        let (page, size) = clamp_paging(page, size);
        let trades = vec![Trade {
            trade_id: new_order_id(),
            order_id: associated_order_id
                .map(str::to_string)
                .unwrap_or_else(new_order_id),
            asset: "APT".to_string(),
            side: OrderSide::Buy,
            price: "12.25".to_string(),
            size: 1.0,
            fee: 0.001,
            timestamp: now(),
        }];
        paginate(trades, page, size)
    }

    pub async fn get_order_status(&self, order_ids: &[String]) -> Vec<OrderStatusEntry> {
        let mut entries = Vec::with_capacity(order_ids.len());
        for id in order_ids {
            let entry = if let Some(order) = self.cache.open_order(id).await {
                OrderStatusEntry::Open(order)
            } else if let Some(order) = self.cache.submitted(id).await {
                OrderStatusEntry::Submitted(order)
            } else {
                OrderStatusEntry::NotFound(UnknownOrder {
                    order_id: id.clone(),
                    status: "NOT_FOUND",
                })
            };
            entries.push(entry);
        }
        entries
    }

    pub async fn get_asset(&self, symbol: &str) -> Result<Asset, AdapterError> {
        self.cache
            .asset(symbol)
            .await
            .ok_or_else(|| AdapterError::not_found(format!("Asset not found: {symbol}")))
    }

    pub async fn get_position(&self, asset: &str) -> Result<Position, AdapterError> {
        self.cache
            .position(asset)
            .await
            .ok_or_else(|| AdapterError::not_found(format!("Position not found: {asset}")))
    }

    pub async fn has_open_position(&self, asset: &str) -> bool {
        self.cache
            .position(asset)
            .await
            .is_some_and(|p| p.size > 0.0)
    }

    pub async fn has_open_orders(&self, asset: Option<&str>) -> bool {
        self.cache.has_active_order(asset).await
    }

    pub async fn refresh_all_data(&self) -> RefreshSummary {
        let _ = tokio::join!(
            self.fetch_assets(),
            self.fetch_open_orders(None, None, None, None),
            self.fetch_positions(None, None),
            self.fetch_balance(),
        );
        let updated = Utc::now();
        self.cache.mark_updated(updated.timestamp_millis());
        info!("Portfolio data refreshed");
        RefreshSummary {
            success: true,
            timestamp: updated.to_rfc3339(),
            last_update_time: self.cache.last_update_ms(),
            balance: self.cache.balance().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::testing::{ChainBehavior, MockChain};
    use crate::domains::trading::OrderState;

    fn config(account: Option<&str>) -> ChainConfig {
        ChainConfig {
            account: account.map(str::to_string),
            vault_address: "0xvault".to_string(),
            ..ChainConfig::default()
        }
    }

    fn trader(behavior: ChainBehavior, account: Option<&str>) -> (AptosTrader, Arc<MockChain>) {
        let chain = Arc::new(MockChain::new(behavior));
        (
            AptosTrader::new(chain.clone(), &config(account), Duration::from_secs(5)),
            chain,
        )
    }

    #[tokio::test]
    async fn test_limit_order_allocates_octas() {
        let (trader, chain) = trader(ChainBehavior::Fixed(vec![json!(true)]), Some("0xacct"));
        let receipt = trader
            .place_limit_order("APT", true, "12.50", 1.5, None, false)
            .await
            .unwrap();
        assert!(receipt.response.success);
        assert!(receipt.order_id.starts_with("apt_"));

        let calls = chain.view_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "0xvault::hyperfill_vault::execute_vault_action");
        assert_eq!(
            calls[0].1,
            vec![json!("0xvault"), json!("allocate"), json!("150000000"), json!("0xacct")]
        );

        let status = trader.get_order_status(&[receipt.order_id.clone()]).await;
        match &status[0] {
            OrderStatusEntry::Submitted(order) => {
                assert_eq!(order.status, OrderState::Acknowledged);
                assert_eq!(order.leverage, Some(1.1));
            }
            other => panic!("unexpected status entry: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_chain_call_keeps_order_id() {
        let (trader, _) = trader(ChainBehavior::Fail, Some("0xacct"));
        let receipt = trader
            .place_market_order("APT", false, 2.0, None, None, false)
            .await
            .unwrap();
        assert!(!receipt.response.success);
        assert!(receipt.response.error.is_some());

        let status = trader.get_order_status(&[receipt.order_id]).await;
        assert!(matches!(
            &status[0],
            OrderStatusEntry::Submitted(o) if o.status == OrderState::Failed && o.slippage == Some(5.0)
        ));
    }

    #[tokio::test]
    async fn test_missing_account_reported_in_receipt() {
        let (trader, chain) = trader(ChainBehavior::Fixed(vec![]), None);
        let receipt = trader
            .place_limit_order("APT", true, "12.50", 1.0, None, false)
            .await
            .unwrap();
        assert!(!receipt.response.success);
        assert!(receipt.response.error.unwrap().contains("HYPERFILL_ACCOUNT"));
        assert_eq!(chain.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_size_rejected_before_chain() {
        let (trader, chain) = trader(ChainBehavior::Fixed(vec![]), Some("0xacct"));
        for size in [0.0, -1.0, f64::NAN] {
            let err = trader
                .place_limit_order("APT", true, "12.50", size, None, false)
                .await
                .unwrap_err();
            assert!(matches!(err, AdapterError::InvalidArgument(_)));
        }
        assert!(trader.add_collateral("APT", -5.0, true).await.is_err());
        assert_eq!(chain.calls(), 0);
    }

    #[tokio::test]
    async fn test_close_position_defaults_quantity() {
        let (trader, chain) = trader(ChainBehavior::Fixed(vec![]), None);
        let receipt = trader.close_position("APT", "13.00", None).await.unwrap();
        assert!(receipt.response.success);
        assert_eq!(
            chain.view_calls()[0].1,
            vec![json!("0xvault"), json!("return_funds"), json!("100000000")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_chain_times_out() {
        let (trader, _) = trader(ChainBehavior::Hang, Some("0xacct"));
        let outcome = trader.cancel_order("apt_1_abc").await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_positions_from_shares() {
        let (trader, _) = trader(ChainBehavior::Fixed(vec![json!("250000000")]), Some("0xacct"));
        let positions = trader.fetch_positions(None, None).await;
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].size, 2.5);
        assert!(trader.has_open_position("APT").await);
        assert_eq!(trader.get_position("APT").await.unwrap().side, "LONG");
    }

    #[tokio::test]
    async fn test_positions_empty_on_chain_failure() {
        let (trader, _) = trader(ChainBehavior::Fail, Some("0xacct"));
        assert!(trader.fetch_positions(None, None).await.is_empty());
        assert!(!trader.has_open_position("APT").await);
        assert!(matches!(
            trader.get_position("APT").await,
            Err(AdapterError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_balance_from_coin_store() {
        let chain = Arc::new(MockChain::new(ChainBehavior::Fixed(vec![])).with_resource(
            json!({ "coin": { "value": "1234500000" } }),
        ));
        let trader = AptosTrader::new(chain, &config(Some("0xacct")), Duration::from_secs(5));
        assert_eq!(trader.fetch_balance().await, 12.345);
        assert_eq!(trader.refresh_all_data().await.balance, 12.345);
    }

    #[tokio::test]
    async fn test_balance_zero_on_failure() {
        let (trader, _) = trader(ChainBehavior::Fail, Some("0xacct"));
        assert_eq!(trader.fetch_balance().await, 0.0);
    }

    #[tokio::test]
    async fn test_asset_lookup_requires_fetch() {
        let (trader, _) = trader(ChainBehavior::Fail, None);
        assert!(trader.get_asset("APT").await.is_err());
        trader.fetch_assets().await;
        assert_eq!(trader.get_asset("APT").await.unwrap().precision, 8);
    }

    #[tokio::test]
    async fn test_open_orders_and_status() {
        let (trader, _) = trader(ChainBehavior::Fail, None);
        let orders = trader
            .fetch_open_orders(Some("APT"), Some(OrderSide::Sell), None, None)
            .await;
        assert_eq!(orders[0].side, OrderSide::Sell);
        assert!(trader.has_open_orders(Some("APT")).await);
        assert!(!trader.has_open_orders(Some("BTC")).await);

        let status = trader
            .get_order_status(&[orders[0].order_id.clone(), "missing".to_string()])
            .await;
        assert!(matches!(&status[0], OrderStatusEntry::Open(_)));
        assert_eq!(
            serde_json::to_value(&status[1]).unwrap(),
            json!({ "orderId": "missing", "status": "NOT_FOUND" })
        );
    }

    #[tokio::test]
    async fn test_paging_beyond_end_is_empty() {
        let (trader, _) = trader(ChainBehavior::Fail, None);
        assert!(trader.fetch_open_orders(None, None, Some(3), Some(10)).await.is_empty());
        assert_eq!(trader.fetch_trade_history(Some(-4), Some(0), Some("apt_x")).await[0].order_id, "apt_x");
    }

    #[test]
    fn test_clamp_paging() {
        assert_eq!(clamp_paging(None, None), (0, 10));
        assert_eq!(clamp_paging(Some(-1), Some(0)), (0, 1));
        assert_eq!(clamp_paging(Some(2), Some(500)), (2, 100));
    }

    #[tokio::test]
    async fn test_refresh_updates_timestamp() {
        let (trader, _) = trader(ChainBehavior::Fail, Some("0xacct"));
        let summary = trader.refresh_all_data().await;
        assert!(summary.success);
        assert!(summary.last_update_time > 0);
        assert_eq!(summary.balance, 0.0);
        assert!(trader.get_asset("APT").await.is_ok());
        assert!(trader.has_open_orders(None).await);
    }
}
