//! Collaborator trait contracts the engine consumes but never constructs a
//! concrete instance of internally — the engine owns `Box<dyn Trait>`
//! handles so callers can swap implementations, mirroring the dynamic
//! dispatch the source's `Executor` trait (`bog-core/src/execution/mod.rs`)
//! uses for live/simulated/paper executors.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::order::{Order, OrderId, Position};

/// Virtual clock the engine advances from tick timestamps. Engine-scoped,
/// never process-global, per the "no global mutable clock" design note.
pub trait Clock {
    fn set_time(&mut self, time: chrono::DateTime<chrono::Utc>);
    fn time_now(&self) -> chrono::DateTime<chrono::Utc>;
}

/// A plain struct-backed clock: the reference implementation used by tests
/// and by `Engine::new` when no other clock is supplied.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulationClock {
    now: Option<chrono::DateTime<chrono::Utc>>,
}

impl Clock for SimulationClock {
    fn set_time(&mut self, time: chrono::DateTime<chrono::Utc>) {
        self.now = Some(time);
    }

    fn time_now(&self) -> chrono::DateTime<chrono::Utc> {
        self.now.expect("clock read before any tick was processed")
    }
}

/// Deterministic, reproducible event-id generator.
pub trait GuidFactory {
    fn generate(&mut self) -> String;
}

/// Monotonic counter id generator — deterministic across runs given the
/// same starting value, satisfying the §8 determinism property.
#[derive(Debug, Clone)]
pub struct CountingGuidFactory {
    prefix: String,
    next: u64,
}

impl CountingGuidFactory {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl GuidFactory for CountingGuidFactory {
    fn generate(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Stochastic oracle deciding slippage and marginal fills. Implementations
/// must be seeded/reproducible to satisfy the determinism property.
pub trait FillModel {
    fn is_slipped(&mut self) -> bool;
    fn is_stop_filled(&mut self) -> bool;
    fn is_limit_filled(&mut self) -> bool;
}

/// Always-deterministic fill model useful for literal scenario tests: every
/// probability is a fixed bool decided up front rather than drawn from an
/// RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedFillModel {
    pub slipped: bool,
    pub stop_filled: bool,
    pub limit_filled: bool,
}

impl FillModel for ScriptedFillModel {
    fn is_slipped(&mut self) -> bool {
        self.slipped
    }

    fn is_stop_filled(&mut self) -> bool {
        self.stop_filled
    }

    fn is_limit_filled(&mut self) -> bool {
        self.limit_filled
    }
}

/// Seeded RNG-backed fill model for use outside literal scenario tests,
/// in the style of `bog-core`'s `RealisticSimulator`.
pub struct RandomFillModel {
    rng: rand::rngs::StdRng,
    slip_probability: f64,
    stop_fill_probability: f64,
    limit_fill_probability: f64,
}

impl RandomFillModel {
    pub fn new(seed: u64, slip_probability: f64, stop_fill_probability: f64, limit_fill_probability: f64) -> Self {
        use rand::SeedableRng;
        Self {
            rng: rand::rngs::StdRng::seed_from_u64(seed),
            slip_probability,
            stop_fill_probability,
            limit_fill_probability,
        }
    }
}

impl FillModel for RandomFillModel {
    fn is_slipped(&mut self) -> bool {
        use rand::Rng;
        self.rng.gen::<f64>() < self.slip_probability
    }

    fn is_stop_filled(&mut self) -> bool {
        use rand::Rng;
        self.rng.gen::<f64>() < self.stop_fill_probability
    }

    fn is_limit_filled(&mut self) -> bool {
        use rand::Rng;
        self.rng.gen::<f64>() < self.limit_fill_probability
    }
}

/// Read-only (from the engine's perspective) directory of orders and
/// positions, keyed by id.
pub trait ExecutionDatabase {
    fn get_order(&self, id: &OrderId) -> Option<&Order>;
    fn get_position_for_order(&self, order_id: &OrderId) -> Option<&Position>;
    fn get_positions_open(&self) -> &HashMap<OrderId, Position>;
}

/// In-memory execution database. The engine treats this collaborator as
/// read-only; population is the embedding application's responsibility.
#[derive(Debug, Default)]
pub struct InMemoryExecutionDatabase {
    pub orders: HashMap<OrderId, Order>,
    pub positions: HashMap<OrderId, Position>,
}

impl ExecutionDatabase for InMemoryExecutionDatabase {
    fn get_order(&self, id: &OrderId) -> Option<&Order> {
        self.orders.get(id)
    }

    fn get_position_for_order(&self, order_id: &OrderId) -> Option<&Position> {
        self.positions.get(order_id)
    }

    fn get_positions_open(&self) -> &HashMap<OrderId, Position> {
        &self.positions
    }
}

/// Per-symbol overnight financing rate source, backed by a CSV table in
/// production (`Config::short_term_interest_csv_path`).
pub trait RolloverInterestCalculator {
    fn calc_overnight_rate(&self, symbol: &str, timestamp: chrono::DateTime<chrono::Utc>) -> Decimal;
}

/// A rollover calculator that returns a single configured rate for every
/// symbol/date — sufficient for the literal scenario in §8.6 and for tests
/// that don't exercise a real CSV-backed table.
#[derive(Debug, Clone, Copy)]
pub struct FlatRolloverRate(pub Decimal);

impl RolloverInterestCalculator for FlatRolloverRate {
    fn calc_overnight_rate(&self, _symbol: &str, _timestamp: chrono::DateTime<chrono::Utc>) -> Decimal {
        self.0
    }
}

/// Commission calculator collaborator.
pub trait CommissionCalculator {
    fn calculate(&self, symbol: &str, filled_qty: Decimal, fill_price: Decimal, fx: Decimal, account_currency: &str) -> Decimal;
}

/// Basis-point commission on notional, converted to account currency —
/// the one concrete scheme the design names (`commission_rate_bp`).
#[derive(Debug, Clone, Copy)]
pub struct BasisPointCommission {
    pub rate_bp: Decimal,
}

impl CommissionCalculator for BasisPointCommission {
    fn calculate(&self, _symbol: &str, filled_qty: Decimal, fill_price: Decimal, fx: Decimal, _account_currency: &str) -> Decimal {
        let notional = filled_qty * fill_price;
        notional * (self.rate_bp / Decimal::from(10_000)) * fx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn counting_guid_factory_is_deterministic_across_instances() {
        let mut a = CountingGuidFactory::new("E");
        let mut b = CountingGuidFactory::new("E");
        assert_eq!(a.generate(), b.generate());
        assert_eq!(a.generate(), b.generate());
    }

    #[test]
    fn scripted_fill_model_returns_fixed_values() {
        let mut model = ScriptedFillModel {
            slipped: true,
            stop_filled: false,
            limit_filled: true,
        };
        assert!(model.is_slipped());
        assert!(!model.is_stop_filled());
        assert!(model.is_limit_filled());
    }

    #[test]
    fn basis_point_commission_scales_with_notional() {
        let calc = BasisPointCommission { rate_bp: dec!(1) };
        let commission = calc.calculate("EURUSD", dec!(100000), dec!(1.1), dec!(1), "USD");
        assert_eq!(commission, dec!(11));
    }
}
