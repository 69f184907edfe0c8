//! The discriminated event union and its sink.
//!
//! Every observable effect of the engine is one of these nine variants,
//! dispatched through a single [`EventSink::handle_event`] call — the
//! "tagged sum / one handle_event" shape called for in §9.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::AccountState;
use crate::order::{OrderId, OrderType, Side};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountStateEvent {
    pub account: AccountState,
    pub event_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWorkingPayload {
    pub broker_id: String,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub expire_time: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFilledPayload {
    pub execution_id: String,
    pub position_id_broker: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub fill_price: Decimal,
    pub quote_currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderModifiedPayload {
    pub modified_quantity: Decimal,
    pub modified_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Event {
    AccountState(AccountStateEvent),
    OrderSubmitted {
        order_id: OrderId,
        event_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    OrderAccepted {
        order_id: OrderId,
        event_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    OrderRejected {
        order_id: OrderId,
        reason: String,
        event_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    OrderWorking {
        order_id: OrderId,
        payload: OrderWorkingPayload,
        event_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    OrderModified {
        order_id: OrderId,
        payload: OrderModifiedPayload,
        event_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    OrderCancelled {
        order_id: OrderId,
        event_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    OrderExpired {
        order_id: OrderId,
        event_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    OrderFilled {
        order_id: OrderId,
        payload: OrderFilledPayload,
        event_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    OrderCancelReject {
        order_id: OrderId,
        action: String,
        reason: String,
        event_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl Event {
    /// The order this event pertains to, if any (`AccountState` has none).
    pub fn order_id(&self) -> Option<&OrderId> {
        match self {
            Event::AccountState(_) => None,
            Event::OrderSubmitted { order_id, .. }
            | Event::OrderAccepted { order_id, .. }
            | Event::OrderRejected { order_id, .. }
            | Event::OrderWorking { order_id, .. }
            | Event::OrderModified { order_id, .. }
            | Event::OrderCancelled { order_id, .. }
            | Event::OrderExpired { order_id, .. }
            | Event::OrderFilled { order_id, .. }
            | Event::OrderCancelReject { order_id, .. } => Some(order_id),
        }
    }
}

/// Sink the engine dispatches every emitted event into. Implementations
/// must not re-enter the engine (see §5, "collaborators...
/// must not re-enter the engine").
pub trait EventSink {
    fn handle_event(&mut self, event: Event);
}

/// A sink that simply records events in emission order, used in tests and
/// as a minimal building block for report generators.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<Event>,
}

impl EventSink for RecordingSink {
    fn handle_event(&mut self, event: Event) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn recording_sink_preserves_emission_order() {
        let mut sink = RecordingSink::default();
        sink.handle_event(Event::OrderSubmitted {
            order_id: OrderId::from("1"),
            event_id: "e1".to_string(),
            timestamp: Utc::now(),
        });
        sink.handle_event(Event::OrderAccepted {
            order_id: OrderId::from("1"),
            event_id: "e2".to_string(),
            timestamp: Utc::now(),
        });
        assert_eq!(sink.events.len(), 2);
        assert!(matches!(sink.events[0], Event::OrderSubmitted { .. }));
        assert!(matches!(sink.events[1], Event::OrderAccepted { .. }));
    }

    #[test]
    fn order_id_accessor_handles_account_state() {
        let event = Event::AccountState(AccountStateEvent {
            account: crate::account::AccountState::new("A", "USD", Decimal::ZERO),
            event_id: "e".to_string(),
            timestamp: Utc::now(),
        });
        assert!(event.order_id().is_none());
    }
}
