//! Cash account bookkeeping: capital, daily activity, commissions, PnL.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Snapshot of the account suitable for emission as an `AccountStateEvent`.
/// Margin fields always report zero per the Non-goals (no margin modelling).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountState {
    pub account_id: String,
    pub currency: String,
    pub cash_balance: Decimal,
    pub cash_start_of_day: Decimal,
    pub cash_activity_today: Decimal,
    pub margin_used_liquidation: Decimal,
    pub margin_used_maintenance: Decimal,
    pub margin_ratio: Decimal,
    pub margin_call_status: char,
}

impl AccountState {
    pub fn new(account_id: impl Into<String>, currency: impl Into<String>, starting_capital: Decimal) -> Self {
        Self {
            account_id: account_id.into(),
            currency: currency.into(),
            cash_balance: starting_capital,
            cash_start_of_day: starting_capital,
            cash_activity_today: Decimal::ZERO,
            margin_used_liquidation: Decimal::ZERO,
            margin_used_maintenance: Decimal::ZERO,
            margin_ratio: Decimal::ZERO,
            margin_call_status: 'N',
        }
    }
}
