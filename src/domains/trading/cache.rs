//! Portfolio cache owned by the trading adapter.
//!
//! Every map sits behind its own lock; writers replace entries per key and
//! no lock is held across an external call.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::RwLock;

use super::model::{Asset, OpenOrder, OpenOrderStatus, Position, SubmittedOrder};

/// Submitted orders kept for status queries. Past this, the oldest is
/// evicted and reports `NOT_FOUND`.
pub const MAX_SUBMITTED_ORDERS: usize = 1024;

/// Submitted orders in arrival order.
#[derive(Debug, Default)]
struct SubmittedLog {
    by_id: HashMap<String, SubmittedOrder>,
    arrival: VecDeque<String>,
}

#[derive(Debug)]
pub struct PortfolioCache {
    assets: RwLock<HashMap<String, Asset>>,
    positions: RwLock<HashMap<String, Position>>,
    open_orders: RwLock<HashMap<String, OpenOrder>>,
    submitted: RwLock<SubmittedLog>,
    submitted_limit: usize,
    balance: RwLock<f64>,
    // `submitted` holds at most `submitted_limit` orders; the other maps are
    // keyed by asset or exchange order id and replaced on refresh.
    last_update_ms: AtomicI64,
}

impl Default for PortfolioCache {
    fn default() -> Self {
        Self::with_submitted_limit(MAX_SUBMITTED_ORDERS)
    }
}

impl PortfolioCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submitted_limit(limit: usize) -> Self {
        Self {
            assets: RwLock::default(),
            positions: RwLock::default(),
            open_orders: RwLock::default(),
            submitted: RwLock::default(),
            submitted_limit: limit.max(1),
            balance: RwLock::default(),
            last_update_ms: AtomicI64::new(0),
        }
    }

    pub async fn put_assets(&self, assets: &[Asset]) {
        let mut map = self.assets.write().await;
        for asset in assets {
            map.insert(asset.symbol.clone(), asset.clone());
        }
    }

    pub async fn asset(&self, symbol: &str) -> Option<Asset> {
        self.assets.read().await.get(symbol).cloned()
    }

    pub async fn put_positions(&self, positions: &[Position]) {
        let mut map = self.positions.write().await;
        for position in positions {
            map.insert(position.asset.clone(), position.clone());
        }
    }

    pub async fn position(&self, asset: &str) -> Option<Position> {
        self.positions.read().await.get(asset).cloned()
    }

    pub async fn put_open_orders(&self, orders: &[OpenOrder]) {
        let mut map = self.open_orders.write().await;
        for order in orders {
            map.insert(order.order_id.clone(), order.clone());
        }
    }

    pub async fn open_order(&self, order_id: &str) -> Option<OpenOrder> {
        self.open_orders.read().await.get(order_id).cloned()
    }

    /// Any active order, optionally restricted to one asset.
    pub async fn has_active_order(&self, asset: Option<&str>) -> bool {
        self.open_orders.read().await.values().any(|o| {
            o.status == OpenOrderStatus::Active && asset.is_none_or(|a| o.asset == a)
        })
    }

    pub async fn record_submitted(&self, order: SubmittedOrder) {
        let mut log = self.submitted.write().await;
        let id = order.order_id.clone();
        if log.by_id.insert(id.clone(), order).is_none() {
            log.arrival.push_back(id);
        }
        while log.arrival.len() > self.submitted_limit {
            if let Some(oldest) = log.arrival.pop_front() {
                log.by_id.remove(&oldest);
            }
        }
    }

    pub async fn submitted(&self, order_id: &str) -> Option<SubmittedOrder> {
        self.submitted.read().await.by_id.get(order_id).cloned()
    }

    pub async fn set_balance(&self, balance: f64) {
        *self.balance.write().await = balance;
    }

    pub async fn balance(&self) -> f64 {
        *self.balance.read().await
    }

    pub fn mark_updated(&self, at_ms: i64) {
        self.last_update_ms.store(at_ms, Ordering::Relaxed);
    }

    /// Unix millis of the last full refresh; 0 if never refreshed.
    pub fn last_update_ms(&self) -> i64 {
        self.last_update_ms.load(Ordering::Relaxed)
    }
}
