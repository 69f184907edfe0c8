//! Static per-symbol instrument metadata.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityType {
    Fx,
    Other,
}

/// Immutable catalog entry. One per symbol, loaded once at engine startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub quote_currency: String,
    pub security_type: SecurityType,
    pub tick_size: Decimal,
    pub price_precision: u32,
    pub min_trade_size: Decimal,
    pub max_trade_size: Decimal,
    /// Minimum distance, in ticks, a STOP-kind order must sit away from the
    /// opposing touch price.
    pub min_stop_distance_ticks: u32,
    /// Minimum distance, in ticks, a LIMIT order must sit away from the
    /// opposing touch price.
    pub min_limit_distance_ticks: u32,
}

impl Instrument {
    /// Minimum stop distance expressed as a price, i.e. `min_stops[symbol]`.
    pub fn min_stop_distance(&self) -> Decimal {
        self.tick_size * Decimal::from(self.min_stop_distance_ticks)
    }

    /// Minimum limit distance expressed as a price, i.e. `min_limits[symbol]`.
    pub fn min_limit_distance(&self) -> Decimal {
        self.tick_size * Decimal::from(self.min_limit_distance_ticks)
    }

    /// Slippage unit applied to a slipped fill — equal to the tick size.
    pub fn slippage(&self) -> Decimal {
        self.tick_size
    }

    /// Round a price to this instrument's declared precision.
    pub fn round_price(&self, price: Decimal) -> Decimal {
        price.round_dp(self.price_precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn eurusd() -> Instrument {
        Instrument {
            symbol: "EURUSD".to_string(),
            quote_currency: "USD".to_string(),
            security_type: SecurityType::Fx,
            tick_size: dec!(0.0001),
            price_precision: 4,
            min_trade_size: dec!(1000),
            max_trade_size: dec!(5000000),
            min_stop_distance_ticks: 5,
            min_limit_distance_ticks: 5,
        }
    }

    #[test]
    fn distances_scale_with_tick_size() {
        let instrument = eurusd();
        assert_eq!(instrument.min_stop_distance(), dec!(0.0005));
        assert_eq!(instrument.min_limit_distance(), dec!(0.0005));
        assert_eq!(instrument.slippage(), dec!(0.0001));
    }

    #[test]
    fn round_price_respects_precision() {
        let instrument = eurusd();
        assert_eq!(instrument.round_price(dec!(1.10007)), dec!(1.1001));
    }
}
