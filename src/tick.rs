//! Market ticks and the per-symbol last-seen snapshot.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single top-of-book quote. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub bid: Decimal,
    pub ask: Decimal,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Tick {
    pub fn new(bid: Decimal, ask: Decimal, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        Self { bid, ask, timestamp }
    }

    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

/// `market[symbol] -> Tick`, the engine's view of the last tick seen for
/// every symbol. Backed by an insertion-ordered map so a full snapshot walk
/// (used by the FX rate resolver to build its rate tables) is deterministic.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    last: IndexMap<String, Tick>,
}

impl MarketSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, symbol: &str, tick: Tick) {
        self.last.insert(symbol.to_string(), tick);
    }

    pub fn get(&self, symbol: &str) -> Option<&Tick> {
        self.last.get(symbol)
    }

    pub fn has_market(&self, symbol: &str) -> bool {
        self.last.contains_key(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Tick)> {
        self.last.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn mid_averages_bid_and_ask() {
        let tick = Tick::new(dec!(1.1000), dec!(1.1002), Utc::now());
        assert_eq!(tick.mid(), dec!(1.1001));
    }

    #[test]
    fn snapshot_reports_no_market_until_updated() {
        let mut snapshot = MarketSnapshot::new();
        assert!(!snapshot.has_market("EURUSD"));
        snapshot.update("EURUSD", Tick::new(dec!(1.1000), dec!(1.1002), Utc::now()));
        assert!(snapshot.has_market("EURUSD"));
    }
}
