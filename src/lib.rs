//! Simulated order execution engine for historical market-data backtesting.
//!
//! Consumes a time-ordered stream of market ticks and a stream of trading
//! commands, and emits broker-shaped execution events through a single
//! [`event::EventSink`]. The engine is single-threaded, deterministic, and
//! has no network or file I/O of its own: clocks, ids, fills, persistence
//! and rates are all supplied by collaborators defined as traits in
//! [`collaborators`].

pub mod account;
pub mod collaborators;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod fx;
pub mod instrument;
pub mod logging;
pub mod order;
pub mod registry;
pub mod rollover;
pub mod tick;

pub use anyhow::{Error, Result};

/// Convenience re-exports for downstream strategy harnesses.
pub mod prelude {
    pub use crate::account::AccountState;
    pub use crate::command::{AccountInquiry, AtomicOrder, CancelOrder, ModifyOrder, SubmitAtomicOrder, SubmitOrder};
    pub use crate::collaborators::{
        Clock, CommissionCalculator, ExecutionDatabase, FillModel,
        GuidFactory, RolloverInterestCalculator,
    };
    pub use crate::fx::ExchangeRateCalculator;
    pub use crate::config::Config;
    pub use crate::engine::Engine;
    pub use crate::error::{EngineError, RejectReason};
    pub use crate::event::{Event, EventSink};
    pub use crate::instrument::{Instrument, SecurityType};
    pub use crate::order::{Order, OrderState, OrderType, Side, TimeInForce};
    pub use crate::tick::Tick;
}
