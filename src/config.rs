//! Runtime configuration. Shaped after `bog-core/src/config/types.rs`'s
//! serde `Config` struct, trimmed to exactly the fields §6
//! and §10.3 name plus the engine-scoped knobs the design notes call out as
//! configuration rather than hard-coded constants.

use std::path::PathBuf;

use anyhow::{bail, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rollover::ROLLOVER_OFFSET_MINUTES;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub starting_capital: Decimal,
    pub account_currency: String,
    pub frozen_account: bool,
    pub commission_rate_bp: Decimal,
    pub short_term_interest_csv_path: Option<PathBuf>,
    /// Spread markup subtracted from raw rollover interest (§4.6).
    #[serde(default)]
    pub rollover_spread: Decimal,
    /// The "unexplained -56" from §4.1 step 2, named and documented rather
    /// than hard-coded, per the open question in §9.
    #[serde(default = "default_rollover_offset_minutes")]
    pub rollover_offset_minutes: i64,
}

fn default_rollover_offset_minutes() -> i64 {
    ROLLOVER_OFFSET_MINUTES
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.starting_capital < Decimal::ZERO {
            bail!("starting_capital must be non-negative, got {}", self.starting_capital);
        }
        if self.commission_rate_bp < Decimal::ZERO {
            bail!("commission_rate_bp must be non-negative, got {}", self.commission_rate_bp);
        }
        if self.account_currency.len() != 3 {
            bail!(
                "account_currency must be a 3-letter ISO code, got {:?}",
                self.account_currency
            );
        }
        Ok(())
    }
}
