//! End-to-end scenario tests exercising the engine through its public API
//! only, the way a strategy harness would.

use std::collections::HashMap;

use backtest_exec::collaborators::{
    BasisPointCommission, CountingGuidFactory, FlatRolloverRate, InMemoryExecutionDatabase, ScriptedFillModel, SimulationClock,
};
use backtest_exec::command::{CancelOrder, SubmitOrder};
use backtest_exec::engine::{Collaborators, Engine};
use backtest_exec::event::RecordingSink;
use backtest_exec::fx::DefaultExchangeRateCalculator;
use backtest_exec::instrument::{Instrument, SecurityType};
use backtest_exec::order::{Order, OrderId, OrderType, Side};
use backtest_exec::prelude::Config;
use backtest_exec::tick::Tick;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn eurusd() -> Instrument {
    Instrument {
        symbol: "EURUSD".to_string(),
        quote_currency: "USD".to_string(),
        security_type: SecurityType::Fx,
        tick_size: dec!(0.0001),
        price_precision: 4,
        min_trade_size: dec!(1000),
        max_trade_size: dec!(5_000_000),
        min_stop_distance_ticks: 5,
        min_limit_distance_ticks: 5,
    }
}

fn new_engine() -> Engine {
    let config = Config {
        starting_capital: dec!(100000),
        account_currency: "USD".to_string(),
        frozen_account: false,
        commission_rate_bp: dec!(0),
        short_term_interest_csv_path: None,
        rollover_spread: Decimal::ZERO,
        rollover_offset_minutes: backtest_exec::rollover::ROLLOVER_OFFSET_MINUTES,
    };
    config.validate().expect("harness config is always valid");

    let mut instruments = HashMap::new();
    instruments.insert("EURUSD".to_string(), eurusd());

    let collaborators = Collaborators {
        clock: Box::new(SimulationClock::default()),
        guid_factory: Box::new(CountingGuidFactory::new("E")),
        fill_model: Box::new(ScriptedFillModel::default()),
        database: Some(Box::new(InMemoryExecutionDatabase::default())),
        event_sink: Box::new(RecordingSink::default()),
        rollover_calculator: Box::new(FlatRolloverRate(dec!(0.0001))),
        commission_calculator: Box::new(BasisPointCommission { rate_bp: dec!(0) }),
        exchange_rate_calculator: Box::new(DefaultExchangeRateCalculator::new()),
    };

    Engine::new(config, instruments, "ACC-1", collaborators)
}

fn t(hour: u32, min: u32, sec: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, hour, min, sec).unwrap()
}

#[test]
fn market_order_fills_immediately_on_submission() {
    let mut engine = new_engine();
    engine.process_tick("EURUSD", Tick::new(dec!(1.1000), dec!(1.1002), t(9, 30, 0)));

    engine.submit_order(SubmitOrder {
        trader_id: "strategy-1".into(),
        account_id: "ACC-1".into(),
        strategy_id: "S1".into(),
        position_id: None,
        order: Order::new(OrderId::from("100"), "EURUSD", Side::Buy, OrderType::Market, dec!(50000), None),
    });

    assert!(!engine.is_working(&OrderId::from("100")));
}

#[test]
fn working_limit_order_is_cancellable_before_it_triggers() {
    let mut engine = new_engine();
    engine.process_tick("EURUSD", Tick::new(dec!(1.1000), dec!(1.1002), t(9, 30, 0)));

    engine.submit_order(SubmitOrder {
        trader_id: "strategy-1".into(),
        account_id: "ACC-1".into(),
        strategy_id: "S1".into(),
        position_id: None,
        order: Order::new(
            OrderId::from("101"),
            "EURUSD",
            Side::Buy,
            OrderType::Limit,
            dec!(50000),
            Some(dec!(1.0900)),
        ),
    });
    assert!(engine.is_working(&OrderId::from("101")));

    engine.cancel_order(CancelOrder {
        account_id: "ACC-1".into(),
        order_id: OrderId::from("101"),
    });
    assert!(!engine.is_working(&OrderId::from("101")));
}

#[test]
fn order_submitted_with_no_prior_tick_is_rejected_for_no_market() {
    let mut engine = new_engine();
    engine.submit_order(SubmitOrder {
        trader_id: "strategy-1".into(),
        account_id: "ACC-1".into(),
        strategy_id: "S1".into(),
        position_id: None,
        order: Order::new(
            OrderId::from("102"),
            "EURUSD",
            Side::Buy,
            OrderType::Limit,
            dec!(50000),
            Some(dec!(1.1)),
        ),
    });
    // No direct event introspection here (engine owns the sink); absence of
    // a panic and the order never reaching working_orders is the assertion.
    assert!(!engine.is_working(&OrderId::from("102")));
}

#[test]
fn account_inquiry_does_not_panic_with_no_activity() {
    let mut engine = new_engine();
    engine.account_inquiry(backtest_exec::command::AccountInquiry {
        account_id: "ACC-1".into(),
    });
    assert_eq!(engine.account_snapshot().cash_balance, dec!(100000));
}

/// Confirms the engine is deterministic: two engines fed the identical
/// tick/command sequence produce identical account state (§8 determinism
/// property), observed indirectly since `Engine` exposes no direct event
/// history outside of the configured sink.
#[test]
fn two_identically_driven_engines_reach_identical_account_state() {
    let mut a = new_engine();
    let mut b = new_engine();

    for engine in [&mut a, &mut b] {
        engine.process_tick("EURUSD", Tick::new(dec!(1.1000), dec!(1.1002), t(9, 30, 0)));
        engine.submit_order(SubmitOrder {
            trader_id: "strategy-1".into(),
            account_id: "ACC-1".into(),
            strategy_id: "S1".into(),
            position_id: None,
            order: Order::new(OrderId::from("200"), "EURUSD", Side::Buy, OrderType::Market, dec!(50000), None),
        });
    }

    assert_eq!(a.account_snapshot().cash_balance, b.account_snapshot().cash_balance);
}
