//! Order ids and the submitted-order lifecycle.

use chrono::Utc;
use rand::Rng;
use serde::Serialize;

use super::model::{CallOutcome, OrderKind, SubmittedOrder};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `apt_<unix-millis>_<9 base36 chars>`.
pub fn new_order_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("apt_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// `CREATED -> ACKNOWLEDGED | FAILED`; terminal states do not move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Created,
    Acknowledged,
    Failed,
}

impl OrderState {
    pub fn complete(self, success: bool) -> Self {
        match (self, success) {
            (Self::Created, true) => Self::Acknowledged,
            (Self::Created, false) => Self::Failed,
            (terminal, _) => terminal,
        }
    }
}

/// Parameters of a new order, before submission.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub kind: OrderKind,
    pub asset: String,
    pub is_buy: Option<bool>,
    pub size: f64,
    pub price: Option<String>,
    pub leverage: Option<f64>,
    pub slippage: Option<f64>,
    pub reduce_only: bool,
}

impl OrderDraft {
    /// Assign an id; the order starts out `CREATED`.
    pub fn create(self) -> SubmittedOrder {
        SubmittedOrder {
            order_id: new_order_id(),
            kind: self.kind,
            asset: self.asset,
            is_buy: self.is_buy,
            size: self.size,
            price: self.price,
            leverage: self.leverage,
            slippage: self.slippage,
            reduce_only: self.reduce_only,
            status: OrderState::Created,
            error: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl SubmittedOrder {
    /// Apply the outcome of the external call.
    pub fn settle(mut self, outcome: &CallOutcome) -> Self {
        self.status = self.status.complete(outcome.success);
        self.error = outcome.error.clone();
        self
    }
}
