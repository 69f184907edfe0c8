//! FX rate resolver: direct, inverse and triangulated cross rates built
//! from the current market snapshot.
//!
//! No reference implementation in the retrieval pack covers this concern
//! directly (see `DESIGN.md`); the rate-map-keyed-by-6-letter-symbol shape
//! and BID/ASK/MID selection follow §4.8 literally, built in
//! the collaborator-trait idiom used throughout the rest of this crate.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tick::MarketSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceType {
    Bid,
    Ask,
    Mid,
}

/// `get_rate(from, to, price_type, bid_rates, ask_rates) -> double`.
pub trait ExchangeRateCalculator {
    fn get_rate(
        &self,
        from: &str,
        to: &str,
        price_type: PriceType,
        bid_rates: &HashMap<String, Decimal>,
        ask_rates: &HashMap<String, Decimal>,
    ) -> Option<Decimal>;
}

/// Build `bid_rates`/`ask_rates` keyed by 6-letter `BASE+QUOTE` symbol from
/// the current market snapshot, the way the matching engine is described to
/// do in §4.8 ("matching engine simply supplies the current snapshot").
pub fn rate_maps_from_snapshot(snapshot: &MarketSnapshot) -> (HashMap<String, Decimal>, HashMap<String, Decimal>) {
    let mut bid_rates = HashMap::new();
    let mut ask_rates = HashMap::new();
    for (symbol, tick) in snapshot.iter() {
        bid_rates.insert(symbol.clone(), tick.bid);
        ask_rates.insert(symbol.clone(), tick.ask);
    }
    (bid_rates, ask_rates)
}

/// Default resolver: direct lookup, inverse lookup, then a single
/// triangulation hop through a common quote currency (USD, the conventional
/// FX vehicle currency). Returns `None` if no path is found, which the
/// caller treats as an environmental gap (§7 category 3).
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultExchangeRateCalculator {
    /// Currency used as the triangulation hop when no direct or inverse
    /// quote exists for the requested pair.
    pub vehicle_currency: &'static str,
}

impl DefaultExchangeRateCalculator {
    pub fn new() -> Self {
        Self { vehicle_currency: "USD" }
    }

    /// Looks up `base+quote` directly, or `quote+base` inverted, combining
    /// bid/ask into a mid when `price_type == Mid`.
    fn direct_or_inverse(
        &self,
        base: &str,
        quote: &str,
        price_type: PriceType,
        bid_rates: &HashMap<String, Decimal>,
        ask_rates: &HashMap<String, Decimal>,
    ) -> Option<Decimal> {
        let direct_symbol = format!("{base}{quote}");
        if let Some(rate) = self.lookup(&direct_symbol, price_type, bid_rates, ask_rates) {
            return Some(rate);
        }
        let inverse_symbol = format!("{quote}{base}");
        self.lookup(&inverse_symbol, price_type, bid_rates, ask_rates)
            .map(|rate| Decimal::ONE / rate)
    }

    fn lookup(
        &self,
        symbol: &str,
        price_type: PriceType,
        bid_rates: &HashMap<String, Decimal>,
        ask_rates: &HashMap<String, Decimal>,
    ) -> Option<Decimal> {
        match price_type {
            PriceType::Bid => bid_rates.get(symbol).copied(),
            PriceType::Ask => ask_rates.get(symbol).copied(),
            PriceType::Mid => {
                let bid = bid_rates.get(symbol).copied();
                let ask = ask_rates.get(symbol).copied();
                match (bid, ask) {
                    (Some(b), Some(a)) => Some((b + a) / Decimal::TWO),
                    (Some(b), None) => Some(b),
                    (None, Some(a)) => Some(a),
                    (None, None) => None,
                }
            }
        }
    }
}

impl ExchangeRateCalculator for DefaultExchangeRateCalculator {
    fn get_rate(
        &self,
        from: &str,
        to: &str,
        price_type: PriceType,
        bid_rates: &HashMap<String, Decimal>,
        ask_rates: &HashMap<String, Decimal>,
    ) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }
        if let Some(rate) = self.direct_or_inverse(from, to, price_type, bid_rates, ask_rates) {
            return Some(rate);
        }
        if from == self.vehicle_currency || to == self.vehicle_currency {
            return None;
        }
        let from_to_vehicle = self.direct_or_inverse(from, self.vehicle_currency, price_type, bid_rates, ask_rates)?;
        let vehicle_to_to = self.direct_or_inverse(self.vehicle_currency, to, price_type, bid_rates, ask_rates)?;
        Some(from_to_vehicle * vehicle_to_to)
    }
}
