//! The concrete engine struct: a single-threaded, deterministic matching
//! and bookkeeping state machine driven entirely by external calls
//! (`process_tick`, `submit_order`, …), holding trait-object handles for
//! every collaborator rather than inheriting from an abstract base class —
//! the "dynamic dispatch over handlers" design note.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::account::AccountState;
use crate::collaborators::{
    Clock, CommissionCalculator, ExecutionDatabase, FillModel, GuidFactory, RolloverInterestCalculator,
};
use crate::command::{CancelOrder, ModifyOrder, SubmitAtomicOrder, SubmitOrder};
use crate::config::Config;
use crate::error::RejectReason;
use crate::event::{AccountStateEvent, Event, EventSink, OrderFilledPayload, OrderModifiedPayload, OrderWorkingPayload};
use crate::fx::{rate_maps_from_snapshot, ExchangeRateCalculator, PriceType};
use crate::instrument::{Instrument, SecurityType};
use crate::order::{MarketPosition, Order, OrderId, OrderState, OrderType, Position, Side};
use crate::registry::OrderRegistry;
use crate::rollover::{compute_rollover, rollover_time_for_day};
use crate::tick::{MarketSnapshot, Tick};

/// Bundled collaborator handles. Grouped into one struct so `Engine::new`
/// doesn't take eight positional arguments.
pub struct Collaborators {
    pub clock: Box<dyn Clock>,
    pub guid_factory: Box<dyn GuidFactory>,
    pub fill_model: Box<dyn FillModel>,
    pub database: Option<Box<dyn ExecutionDatabase>>,
    pub event_sink: Box<dyn EventSink>,
    pub rollover_calculator: Box<dyn RolloverInterestCalculator>,
    pub commission_calculator: Box<dyn CommissionCalculator>,
    pub exchange_rate_calculator: Box<dyn ExchangeRateCalculator>,
}

pub struct Engine {
    config: Config,
    instruments: HashMap<String, Instrument>,
    market: MarketSnapshot,
    registry: OrderRegistry,
    account: AccountState,

    clock: Box<dyn Clock>,
    guid_factory: Box<dyn GuidFactory>,
    fill_model: Box<dyn FillModel>,
    database: Option<Box<dyn ExecutionDatabase>>,
    event_sink: Box<dyn EventSink>,
    rollover_calculator: Box<dyn RolloverInterestCalculator>,
    commission_calculator: Box<dyn CommissionCalculator>,
    exchange_rate_calculator: Box<dyn ExchangeRateCalculator>,

    day_number: Option<chrono::NaiveDate>,
    rollover_time: Option<chrono::DateTime<Utc>>,
    rollover_applied: bool,
    total_commissions: Decimal,
    total_rollover: Decimal,
}

impl Engine {
    pub fn new(
        config: Config,
        instruments: HashMap<String, Instrument>,
        account_id: impl Into<String>,
        collaborators: Collaborators,
    ) -> Self {
        let account_currency = config.account_currency.clone();
        let starting_capital = config.starting_capital;
        Self {
            account: AccountState::new(account_id, account_currency, starting_capital),
            config,
            instruments,
            market: MarketSnapshot::new(),
            registry: OrderRegistry::new(),
            clock: collaborators.clock,
            guid_factory: collaborators.guid_factory,
            fill_model: collaborators.fill_model,
            database: collaborators.database,
            event_sink: collaborators.event_sink,
            rollover_calculator: collaborators.rollover_calculator,
            commission_calculator: collaborators.commission_calculator,
            exchange_rate_calculator: collaborators.exchange_rate_calculator,
            day_number: None,
            rollover_time: None,
            rollover_applied: false,
            total_commissions: Decimal::ZERO,
            total_rollover: Decimal::ZERO,
        }
    }

    pub fn account_snapshot(&self) -> &AccountState {
        &self.account
    }

    pub fn working_order_ids(&self) -> impl Iterator<Item = &OrderId> {
        self.registry.working_orders.keys()
    }

    pub fn is_working(&self, id: &OrderId) -> bool {
        self.registry.working_orders.contains_key(id)
    }

    pub fn oco_partner(&self, id: &OrderId) -> Option<&OrderId> {
        self.registry.oco_partner(id)
    }

    // ---------------------------------------------------------------
    // §4.1 tick processing (matching loop)
    // ---------------------------------------------------------------

    pub fn process_tick(&mut self, symbol: &str, tick: Tick) {
        self.clock.set_time(tick.timestamp);
        self.market.update(symbol, tick);

        let day = tick.timestamp.date_naive();
        if self.day_number != Some(day) {
            self.day_number = Some(day);
            self.account.cash_start_of_day = self.account.cash_balance;
            self.account.cash_activity_today = Decimal::ZERO;
            self.rollover_applied = false;
            self.rollover_time = Some(rollover_time_for_day(day, self.config.rollover_offset_minutes));
            debug!(%day, "day rollover bookkeeping reset");
        }

        if !self.rollover_applied {
            if let Some(rollover_time) = self.rollover_time {
                if tick.timestamp >= rollover_time {
                    self.run_rollover(tick.timestamp);
                    self.rollover_applied = true;
                }
            }
        }

        let snapshot: Vec<OrderId> = self.registry.working_orders.keys().cloned().collect();
        for order_id in snapshot {
            let Some(order) = self.registry.working_orders.get(&order_id) else {
                continue;
            };
            if order.symbol != symbol {
                continue;
            }
            let order_clone = order.clone();

            if order_triggers_fill(&order_clone, &tick, self.fill_model.as_mut()) {
                self.registry.working_orders.shift_remove(&order_id);
                let instrument = self
                    .instruments
                    .get(&order_clone.symbol)
                    .cloned()
                    .expect("instrument catalog missing entry for a working order's symbol");
                let fill_price = fill_price_for(&order_clone, self.fill_model.as_mut(), instrument.slippage());
                debug!(order_id = %order_clone.id, %fill_price, "order triggered fill");
                self.fill_order(order_clone, fill_price);
            } else if let Some(expire_time) = order_clone.expire_time {
                if tick.timestamp >= expire_time {
                    self.registry.working_orders.shift_remove(&order_id);
                    debug!(order_id = %order_clone.id, "order expired");
                    self.expire_order(order_clone);
                }
            }
        }
    }

    // ---------------------------------------------------------------
    // §4.2 command handlers
    // ---------------------------------------------------------------

    pub fn account_inquiry(&mut self, _cmd: crate::command::AccountInquiry) {
        self.emit_account_state();
    }

    pub fn submit_order(&mut self, cmd: SubmitOrder) {
        self.submit_order_inner(cmd.order);
    }

    fn submit_order_inner(&mut self, mut order: Order) {
        info!(order_id = %order.id, symbol = %order.symbol, side = ?order.side, "order submitted");
        let event = Event::OrderSubmitted {
            order_id: order.id.clone(),
            event_id: self.guid_factory.generate(),
            timestamp: self.clock.time_now(),
        };
        self.event_sink.handle_event(event);
        order.state = OrderState::Submitted;
        self.process_order(order);
    }

    pub fn submit_atomic(&mut self, cmd: SubmitAtomicOrder) {
        let atomic = cmd.atomic_order;
        let mut children = vec![atomic.stop_loss];
        if let Some(take_profit) = atomic.take_profit {
            children.push(take_profit);
        }
        if children.len() == 2 {
            self.registry.link_oco(children[0].id.clone(), children[1].id.clone());
        }
        self.registry.atomic_children.insert(atomic.entry.id.clone(), children);
        self.submit_order_inner(atomic.entry);
    }

    pub fn cancel_order(&mut self, cmd: CancelOrder) {
        if !self.registry.working_orders.contains_key(&cmd.order_id) {
            self.emit_cancel_reject(&cmd.order_id, "cancel order", RejectReason::OrderNotFound { id: cmd.order_id.clone() });
            return;
        }
        self.registry.working_orders.shift_remove(&cmd.order_id);
        let event = Event::OrderCancelled {
            order_id: cmd.order_id.clone(),
            event_id: self.guid_factory.generate(),
            timestamp: self.clock.time_now(),
        };
        self.event_sink.handle_event(event);
        self.check_oco(&cmd.order_id);
    }

    pub fn modify_order(&mut self, cmd: ModifyOrder) {
        let Some(order) = self.registry.working_orders.get(&cmd.order_id).cloned() else {
            self.emit_cancel_reject(&cmd.order_id, "modify order", RejectReason::OrderNotFound { id: cmd.order_id.clone() });
            return;
        };

        if cmd.modified_quantity.is_zero() {
            self.emit_cancel_reject(
                &cmd.order_id,
                "modify order",
                RejectReason::ZeroModifiedQuantity { id: cmd.order_id.clone() },
            );
            return;
        }

        let instrument = self
            .instruments
            .get(&order.symbol)
            .cloned()
            .expect("instrument catalog missing entry for a working order's symbol");

        let Some(tick) = self.market.get(&order.symbol).copied() else {
            self.emit_reject(&cmd.order_id, RejectReason::NoMarket { symbol: order.symbol.clone() });
            return;
        };

        let mut hypothetical = order.clone();
        hypothetical.price = cmd.modified_price.or(order.price);
        hypothetical.quantity = cmd.modified_quantity;

        if let Err(reason) = validate_price(&hypothetical, &instrument, &tick) {
            // The modify request is rejected; the still-working order is left
            // untouched (see DESIGN.md for this open-question resolution).
            self.emit_reject(&cmd.order_id, reason);
            return;
        }

        // Per §4.2: the modify path does not update the stored
        // order's price/quantity in the working map (open question, kept
        // as-is rather than "fixed").
        let event = Event::OrderModified {
            order_id: cmd.order_id.clone(),
            payload: OrderModifiedPayload {
                modified_quantity: cmd.modified_quantity,
                modified_price: cmd.modified_price,
            },
            event_id: self.guid_factory.generate(),
            timestamp: self.clock.time_now(),
        };
        self.event_sink.handle_event(event);
    }

    // ---------------------------------------------------------------
    // §4.3 _process_order / _fill_order
    // ---------------------------------------------------------------

    fn process_order(&mut self, order: Order) {
        if self.registry.working_orders.contains_key(&order.id) {
            panic!("{}", crate::error::EngineError::DuplicateOrderId(order.id));
        }

        let instrument = self
            .instruments
            .get(&order.symbol)
            .cloned()
            .unwrap_or_else(|| panic!("no instrument catalog entry for symbol {}", order.symbol));

        if order.quantity > instrument.max_trade_size || order.quantity < instrument.min_trade_size {
            self.reject_order(
                order.clone(),
                RejectReason::InvalidSize {
                    quantity: order.quantity,
                    min: instrument.min_trade_size,
                    max: instrument.max_trade_size,
                },
            );
            return;
        }

        if !self.market.has_market(&order.symbol) {
            self.reject_order(order.clone(), RejectReason::NoMarket { symbol: order.symbol.clone() });
            return;
        }

        let tick = *self.market.get(&order.symbol).expect("market presence just checked");

        if order.order_type != OrderType::Market {
            if let Err(reason) = validate_price(&order, &instrument, &tick) {
                self.reject_order(order, reason);
                return;
            }
        }

        let mut order = order;
        let accepted_event = Event::OrderAccepted {
            order_id: order.id.clone(),
            event_id: self.guid_factory.generate(),
            timestamp: self.clock.time_now(),
        };
        self.event_sink.handle_event(accepted_event);
        order.state = OrderState::Accepted;

        if order.order_type == OrderType::Market {
            let slipped = self.fill_model.is_slipped();
            let slippage = instrument.slippage();
            let fill_price = match order.side {
                Side::Buy => {
                    if slipped {
                        tick.ask + slippage
                    } else {
                        tick.ask
                    }
                }
                Side::Sell => {
                    if slipped {
                        tick.bid - slippage
                    } else {
                        tick.bid
                    }
                }
            };
            self.fill_order(order, fill_price);
        } else {
            order.state = OrderState::Working;
            let working_event = Event::OrderWorking {
                order_id: order.id.clone(),
                payload: OrderWorkingPayload {
                    broker_id: order.id.broker_id(),
                    symbol: order.symbol.clone(),
                    side: order.side,
                    order_type: order.order_type,
                    quantity: order.quantity,
                    price: order.price,
                    expire_time: order.expire_time,
                },
                event_id: self.guid_factory.generate(),
                timestamp: self.clock.time_now(),
            };
            self.registry.working_orders.insert(order.id.clone(), order);
            self.event_sink.handle_event(working_event);
        }
    }

    fn fill_order(&mut self, mut order: Order, fill_price: Decimal) {
        order.state = OrderState::Filled;
        let instrument = self
            .instruments
            .get(&order.symbol)
            .cloned()
            .expect("instrument catalog missing entry for a working order's symbol");
        let fill_price = instrument.round_price(fill_price);

        if let Some(database) = &self.database {
            if let Some(position) = database.get_position_for_order(&order.id).cloned() {
                if position.entry_direction != order.side {
                    self.adjust_account(&order, &position, fill_price, &instrument);
                }
            }
        }

        let event = Event::OrderFilled {
            order_id: order.id.clone(),
            payload: OrderFilledPayload {
                execution_id: order.id.execution_id(),
                position_id_broker: order.id.position_broker_id(),
                symbol: order.symbol.clone(),
                side: order.side,
                quantity: order.quantity,
                fill_price,
                quote_currency: instrument.quote_currency.clone(),
            },
            event_id: self.guid_factory.generate(),
            timestamp: self.clock.time_now(),
        };
        self.event_sink.handle_event(event);

        self.check_oco(&order.id);

        if self.registry.is_atomic_parent(&order.id) {
            // Pop and process one sibling at a time, keeping
            // `atomic_children[order.id]` visible to `check_oco` until every
            // sibling has been processed (§4.3′: process each non-terminal
            // child, then discard the bracket). Rejecting/expiring one
            // sibling can OCO-cascade into the other via `check_oco`, which
            // removes it from this same map entry — popping one at a time
            // means that cascade is observed instead of raced.
            while let Some(next_child) = self
                .registry
                .atomic_children
                .get_mut(&order.id)
                .and_then(|children| if children.is_empty() { None } else { Some(children.remove(0)) })
            {
                if !next_child.state.is_terminal() {
                    self.process_order(next_child);
                }
            }
            self.registry.clean_up_children(&order.id);
        }
    }

    fn expire_order(&mut self, order: Order) {
        let event = Event::OrderExpired {
            order_id: order.id.clone(),
            event_id: self.guid_factory.generate(),
            timestamp: self.clock.time_now(),
        };
        self.event_sink.handle_event(event);
        self.check_oco(&order.id);
        self.discard_atomic_children(&order.id);
    }

    fn reject_order(&mut self, order: Order, reason: RejectReason) {
        self.emit_reject(&order.id, reason);
        self.check_oco(&order.id);
        self.discard_atomic_children(&order.id);
    }

    // ---------------------------------------------------------------
    // §4.4 linkage management
    // ---------------------------------------------------------------

    /// `_check_oco(id)`.
    fn check_oco(&mut self, id: &OrderId) {
        let Some(partner) = self.registry.unlink_oco(id) else {
            return;
        };

        let mut pending_child: Option<(OrderId, OrderId)> = None;
        for (parent_id, children) in self.registry.atomic_children.iter() {
            if children.iter().any(|c| c.id == partner) {
                pending_child = Some((parent_id.clone(), partner.clone()));
                break;
            }
        }

        if let Some((parent_id, child_id)) = pending_child {
            if let Some(children) = self.registry.atomic_children.get_mut(&parent_id) {
                children.retain(|c| c.id != child_id);
            }
            self.emit_reject(&child_id, RejectReason::OcoPartnerRejected { cause_id: id.clone() });
            return;
        }

        if self.registry.working_orders.shift_remove(&partner).is_some() {
            let event = Event::OrderCancelled {
                order_id: partner,
                event_id: self.guid_factory.generate(),
                timestamp: self.clock.time_now(),
            };
            self.event_sink.handle_event(event);
        }
    }

    /// Discards a parent's remaining children, first unlinking any OCO
    /// relation between them (§3: "If entry expires or is rejected,
    /// children are discarded and any OCO linkage between them is
    /// removed").
    fn discard_atomic_children(&mut self, parent_id: &OrderId) {
        if let Some(children) = self.registry.atomic_children.get(parent_id) {
            if let Some(first_child_id) = children.first().map(|c| c.id.clone()) {
                self.registry.unlink_oco(&first_child_id);
            }
        }
        self.registry.clean_up_children(parent_id);
    }

    // ---------------------------------------------------------------
    // §4.6 rollover interest
    // ---------------------------------------------------------------

    fn run_rollover(&mut self, timestamp: chrono::DateTime<Utc>) {
        let Some(database) = &self.database else {
            warn!("rollover requested but no execution database collaborator is configured; skipping");
            return;
        };
        let positions: Vec<Position> = database.get_positions_open().values().cloned().collect();

        let mut total = Decimal::ZERO;
        for position in &positions {
            let Some(instrument) = self.instruments.get(&position.symbol) else {
                continue;
            };
            if instrument.security_type != SecurityType::Fx {
                continue;
            }
            let Some(tick) = self.market.get(&position.symbol) else {
                continue;
            };
            let mid = tick.mid();
            let rate = self.rollover_calculator.calc_overnight_rate(&position.symbol, timestamp);
            let (bid_rates, ask_rates) = rate_maps_from_snapshot(&self.market);
            let Some(fx) = self.exchange_rate_calculator.get_rate(
                &instrument.quote_currency,
                &self.config.account_currency,
                PriceType::Mid,
                &bid_rates,
                &ask_rates,
            ) else {
                warn!(symbol = %position.symbol, "no fx rate for rollover; skipping position");
                continue;
            };
            total += compute_rollover(mid, position.quantity, rate, fx, self.config.rollover_spread, timestamp);
        }

        self.total_rollover += total;

        if !self.config.frozen_account {
            self.account.cash_balance += total;
            self.account.cash_activity_today += total;
            self.emit_account_state();
        }
    }

    // ---------------------------------------------------------------
    // §4.7 PnL & account adjustment
    // ---------------------------------------------------------------

    fn adjust_account(&mut self, fill_order: &Order, position: &Position, fill_price: Decimal, instrument: &Instrument) {
        if matches!(position.market_position, MarketPosition::Flat) {
            panic!("{}", crate::error::EngineError::FlatPositionPnl(fill_order.id.clone()));
        }

        let price_type = match fill_order.side {
            Side::Sell => PriceType::Bid,
            Side::Buy => PriceType::Ask,
        };
        let (bid_rates, ask_rates) = rate_maps_from_snapshot(&self.market);
        let Some(fx) = self.exchange_rate_calculator.get_rate(
            &instrument.quote_currency,
            &self.config.account_currency,
            price_type,
            &bid_rates,
            &ask_rates,
        ) else {
            warn!(
                order_id = %fill_order.id,
                from = %instrument.quote_currency,
                to = %self.config.account_currency,
                "no fx rate; skipping pnl adjustment"
            );
            return;
        };

        let pnl = match position.market_position {
            MarketPosition::Long => (fill_price - position.average_open_price) * position.quantity * fx,
            MarketPosition::Short => (position.average_open_price - fill_price) * position.quantity * fx,
            MarketPosition::Flat => unreachable!("checked above"),
        };

        let commission = self.commission_calculator.calculate(
            &fill_order.symbol,
            fill_order.quantity,
            fill_price,
            fx,
            &self.config.account_currency,
        );
        self.total_commissions -= commission;
        let net_pnl = pnl - commission;

        if !self.config.frozen_account {
            self.account.cash_balance += net_pnl;
            self.account.cash_activity_today += net_pnl;
            self.emit_account_state();
        }
    }

    // ---------------------------------------------------------------
    // shared event helpers
    // ---------------------------------------------------------------

    fn emit_account_state(&mut self) {
        let event = Event::AccountState(AccountStateEvent {
            account: self.account.clone(),
            event_id: self.guid_factory.generate(),
            timestamp: self.clock.time_now(),
        });
        self.event_sink.handle_event(event);
    }

    fn emit_reject(&mut self, order_id: &OrderId, reason: RejectReason) {
        let event = Event::OrderRejected {
            order_id: order_id.clone(),
            reason: reason.to_string(),
            event_id: self.guid_factory.generate(),
            timestamp: self.clock.time_now(),
        };
        self.event_sink.handle_event(event);
    }

    fn emit_cancel_reject(&mut self, order_id: &OrderId, action: &str, reason: RejectReason) {
        let event = Event::OrderCancelReject {
            order_id: order_id.clone(),
            action: action.to_string(),
            reason: reason.to_string(),
            event_id: self.guid_factory.generate(),
            timestamp: self.clock.time_now(),
        };
        self.event_sink.handle_event(event);
    }
}

/// The fill-trigger table from §4.1. Marginal fills (touch price exactly
/// equal to the order price) defer to the fill model.
fn order_triggers_fill(order: &Order, tick: &Tick, fill_model: &mut dyn FillModel) -> bool {
    let price = order.price.expect("a working order always carries a price");
    match (order.side, order.order_type.is_stop_kind(), order.order_type.is_limit()) {
        (Side::Buy, true, _) => tick.ask >= price || (tick.ask == price && fill_model.is_stop_filled()),
        (Side::Buy, false, true) => tick.ask <= price || (tick.ask == price && fill_model.is_limit_filled()),
        (Side::Sell, true, _) => tick.bid <= price || (tick.bid == price && fill_model.is_stop_filled()),
        (Side::Sell, false, true) => tick.bid >= price || (tick.bid == price && fill_model.is_limit_filled()),
        _ => false,
    }
}

fn fill_price_for(order: &Order, fill_model: &mut dyn FillModel, slippage: Decimal) -> Decimal {
    let price = order.price.expect("a working order always carries a price");
    let slipped = fill_model.is_slipped();
    match order.side {
        Side::Buy => {
            if slipped {
                price + slippage
            } else {
                price
            }
        }
        Side::Sell => {
            if slipped {
                price - slippage
            } else {
                price
            }
        }
    }
}

/// §4.5 price validation.
fn validate_price(order: &Order, instrument: &Instrument, tick: &Tick) -> Result<(), RejectReason> {
    let Some(price) = order.price else {
        return Ok(()); // MARKET orders carry no price to validate
    };
    match (order.side, order.order_type.is_stop_kind(), order.order_type.is_limit()) {
        (Side::Buy, true, _) => {
            let min = tick.ask + instrument.min_stop_distance();
            if price < min {
                return Err(RejectReason::PriceDistance {
                    side: Side::Buy,
                    kind: "stop",
                    order_price: price,
                    book_side: "ask",
                    book_price: tick.ask,
                });
            }
        }
        (Side::Buy, false, true) => {
            let max = tick.bid - instrument.min_limit_distance();
            if price > max {
                return Err(RejectReason::PriceDistance {
                    side: Side::Buy,
                    kind: "limit",
                    order_price: price,
                    book_side: "bid",
                    book_price: tick.bid,
                });
            }
        }
        (Side::Sell, true, _) => {
            let max = tick.bid - instrument.min_stop_distance();
            if price > max {
                return Err(RejectReason::PriceDistance {
                    side: Side::Sell,
                    kind: "stop",
                    order_price: price,
                    book_side: "bid",
                    book_price: tick.bid,
                });
            }
        }
        (Side::Sell, false, true) => {
            let min = tick.ask + instrument.min_limit_distance();
            if price < min {
                return Err(RejectReason::PriceDistance {
                    side: Side::Sell,
                    kind: "limit",
                    order_price: price,
                    book_side: "ask",
                    book_price: tick.ask,
                });
            }
        }
        _ => {}
    }
    Ok(())
}
