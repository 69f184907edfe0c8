//! Inbound command payloads (§6). No wire format is prescribed; these are
//! plain structs the embedding strategy harness constructs directly.

use rust_decimal::Decimal;

use crate::order::{Order, OrderId};

#[derive(Debug, Clone)]
pub struct AccountInquiry {
    pub account_id: String,
}

#[derive(Debug, Clone)]
pub struct SubmitOrder {
    pub trader_id: String,
    pub account_id: String,
    pub strategy_id: String,
    pub position_id: Option<OrderId>,
    pub order: Order,
}

#[derive(Debug, Clone)]
pub struct AtomicOrder {
    pub entry: Order,
    pub stop_loss: Order,
    pub take_profit: Option<Order>,
}

#[derive(Debug, Clone)]
pub struct SubmitAtomicOrder {
    pub trader_id: String,
    pub account_id: String,
    pub strategy_id: String,
    pub atomic_order: AtomicOrder,
}

#[derive(Debug, Clone)]
pub struct ModifyOrder {
    pub account_id: String,
    pub order_id: OrderId,
    pub modified_quantity: Decimal,
    pub modified_price: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct CancelOrder {
    pub account_id: String,
    pub order_id: OrderId,
}
