//! Error taxonomy for the engine.
//!
//! Programmer errors ([`EngineError`]) are preconditions a correct caller
//! never violates; they are returned as `Result::Err` so the host can choose
//! to abort, but they must never be translated into an [`crate::event::Event`].
//! Domain rejections ([`RejectReason`]) are the opposite: they never
//! propagate as an `Err`, they are `Display`-formatted into the reason
//! string carried by `OrderRejected` / `OrderCancelReject` events.

use std::fmt;

use rust_decimal::Decimal;

use crate::order::{OrderId, Side};

/// Precondition violations. Fatal: the run should abort with this as the
/// diagnostic, never surfaced through the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// `_process_order` was invoked with an id already present in
    /// `working_orders` or already known to the execution database.
    DuplicateOrderId(OrderId),
    /// PnL was requested on a position whose market_position is FLAT.
    FlatPositionPnl(OrderId),
    /// A rollover pass was requested but no execution database collaborator
    /// is wired up. This is actually an environmental gap (category 3) when
    /// raised from `Engine::run_rollover`, but remains a programmer error
    /// when raised from a code path that is supposed to have checked first.
    MissingDatabase,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::DuplicateOrderId(id) => {
                write!(f, "duplicate order id passed to _process_order: {id}")
            }
            EngineError::FlatPositionPnl(id) => {
                write!(f, "cannot compute pnl for a FLAT position (order {id})")
            }
            EngineError::MissingDatabase => {
                write!(f, "execution database collaborator is not configured")
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Human-readable reasons attached to `OrderRejected` / `OrderCancelReject`
/// events. Never an `Err` variant — purely a message-building helper so the
/// wording used across the engine stays consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    InvalidSize {
        quantity: Decimal,
        min: Decimal,
        max: Decimal,
    },
    NoMarket {
        symbol: String,
    },
    PriceDistance {
        side: Side,
        kind: &'static str,
        order_price: Decimal,
        book_side: &'static str,
        book_price: Decimal,
    },
    OrderNotFound {
        id: OrderId,
    },
    ZeroModifiedQuantity {
        id: OrderId,
    },
    OcoPartnerRejected {
        cause_id: OrderId,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidSize { quantity, min, max } => write!(
                f,
                "order quantity {quantity} outside allowed range [{min}, {max}]"
            ),
            RejectReason::NoMarket { symbol } => write!(f, "no market for {symbol}"),
            RejectReason::PriceDistance {
                side,
                kind,
                order_price,
                book_side,
                book_price,
            } => write!(
                f,
                "{side} {kind} price {order_price} violates minimum distance from {book_side} {book_price}"
            ),
            RejectReason::OrderNotFound { id } => write!(f, "order not found: {id}"),
            RejectReason::ZeroModifiedQuantity { id } => {
                write!(f, "modified quantity is zero for order {id}")
            }
            RejectReason::OcoPartnerRejected { cause_id } => {
                write!(f, "OCO order rejected from {cause_id}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_order_id_message() {
        let err = EngineError::DuplicateOrderId(OrderId::from("42"));
        assert!(format!("{err}").contains("duplicate order id"));
    }

    #[test]
    fn oco_partner_rejected_reason_matches_source_wording() {
        let reason = RejectReason::OcoPartnerRejected {
            cause_id: OrderId::from("7"),
        };
        assert_eq!(format!("{reason}"), "OCO order rejected from 7");
    }
}
