//! Order, order identifiers, and position data types.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier for an order, a position, or a derived id (`"B" + id`,
/// `"E-" + id`, `"ET-" + id`). Kept as an opaque string rather than a numeric
/// type because the engine itself never allocates these — it either echoes
/// an id handed to it by the strategy or derives one with a fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Broker id assigned on accept: `"B" + id`.
    pub fn broker_id(&self) -> String {
        format!("B{}", self.0)
    }

    /// Execution id assigned on fill: `"E-" + id`.
    pub fn execution_id(&self) -> String {
        format!("E-{}", self.0)
    }

    /// Broker position id assigned on fill: `"ET-" + id`.
    pub fn position_broker_id(&self) -> String {
        format!("ET-{}", self.0)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The opposite side of the book an order of this side rests against:
    /// BUY orders are validated/filled against the ask, SELL against the bid.
    pub fn book_side(&self) -> &'static str {
        match self {
            Side::Buy => "ask",
            Side::Sell => "bid",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
    /// Market-if-touched.
    Mit,
}

impl OrderType {
    /// STOP types = {STOP, STOP_LIMIT, MIT}.
    pub fn is_stop_kind(&self) -> bool {
        matches!(self, OrderType::Stop | OrderType::StopLimit | OrderType::Mit)
    }

    pub fn is_limit(&self) -> bool {
        matches!(self, OrderType::Limit)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::Stop => "STOP",
            OrderType::StopLimit => "STOP_LIMIT",
            OrderType::Mit => "MIT",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    Gtc,
    Ioc,
    Fok,
    /// Good-til a specific timestamp, carried on `Order::expire_time`.
    Gtd,
}

/// Closed lifecycle states. See §3 for the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderState {
    Initialized,
    Submitted,
    Accepted,
    Working,
    Filled,
    Cancelled,
    Rejected,
    Expired,
}

impl OrderState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderState::Filled | OrderState::Cancelled | OrderState::Rejected | OrderState::Expired
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    /// Absent for MARKET orders.
    pub price: Option<Decimal>,
    pub time_in_force: TimeInForce,
    pub expire_time: Option<chrono::DateTime<chrono::Utc>>,
    pub label: Option<String>,
    pub state: OrderState,
}

impl Order {
    pub fn new(
        id: impl Into<OrderId>,
        symbol: impl Into<String>,
        side: Side,
        order_type: OrderType,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            side,
            order_type,
            quantity,
            price,
            time_in_force: TimeInForce::Gtc,
            expire_time: None,
            label: None,
            state: OrderState::Initialized,
        }
    }

    pub fn with_expire_time(mut self, expire_time: chrono::DateTime<chrono::Utc>) -> Self {
        self.expire_time = Some(expire_time);
        self.time_in_force = TimeInForce::Gtd;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Net position direction. FLAT positions carry no PnL basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketPosition {
    Long,
    Short,
    Flat,
}

impl MarketPosition {
    /// The side whose fills reduce/close this position.
    pub fn entry_direction(&self) -> Option<Side> {
        match self {
            MarketPosition::Long => Some(Side::Buy),
            MarketPosition::Short => Some(Side::Sell),
            MarketPosition::Flat => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: OrderId,
    pub symbol: String,
    pub market_position: MarketPosition,
    pub quantity: Decimal,
    pub average_open_price: Decimal,
    pub entry_direction: Side,
}
