//! Trading domain: order placement, positions and the portfolio cache.

mod cache;
mod model;
mod order;
mod trader;

pub use model::{
    Asset, CallOutcome, OpenOrder, OpenOrderStatus, OrderKind, OrderReceipt, OrderSide,
    OrderStatusEntry, Position, ProtectiveOrder, RefreshSummary, SubmittedOrder, Trade,
    UnknownOrder,
};
pub use order::{OrderDraft, OrderState, new_order_id};
pub use trader::{AptosTrader, clamp_paging};
