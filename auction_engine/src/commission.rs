//! Commission policy engine.
//!
//! Pure functions computing the platform commission a master owes for winning an order. The policy is tiered: during
//! the master's enrollment month the first few orders are billed at a flat fee, everything after that at a percentage
//! of the accepted price. The functions here have no side effects and are also used to serve preview quotes before
//! any bid is accepted.

use std::{env, fmt::Display, str::FromStr};

use cap_common::Money;
use chrono::{DateTime, Datelike, Utc};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{CommissionTier, MasterProfile},
    traits::AuctionError,
};

pub const DEFAULT_FLAT_FEE: i64 = 5_000;
pub const DEFAULT_FLAT_FEE_CAP: u32 = 3;
pub const DEFAULT_PERCENTAGE_RATE: f64 = 0.03;

//------------------------------------    CommissionConfig   -------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionConfig {
    /// The flat fee charged per order during the enrollment month.
    pub flat_fee: Money,
    /// The number of orders billable at the flat fee. Order number `flat_fee_cap + 1` falls through to the
    /// percentage tier, even inside the enrollment month.
    pub flat_fee_cap: u32,
    /// The fraction of the accepted price charged on the percentage tier.
    pub percentage_rate: f64,
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            flat_fee: Money::from(DEFAULT_FLAT_FEE),
            flat_fee_cap: DEFAULT_FLAT_FEE_CAP,
            percentage_rate: DEFAULT_PERCENTAGE_RATE,
        }
    }
}

impl CommissionConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let flat_fee = env_value("CAP_COMMISSION_FLAT_FEE", defaults.flat_fee.value());
        let flat_fee_cap = env_value("CAP_COMMISSION_FLAT_FEE_CAP", defaults.flat_fee_cap);
        let percentage_rate = env_value("CAP_COMMISSION_RATE", defaults.percentage_rate);
        Self { flat_fee: Money::from(flat_fee), flat_fee_cap, percentage_rate }
    }
}

fn env_value<T: FromStr + Display + Copy>(var: &str, default: T) -> T {
    match env::var(var) {
        Ok(s) => s.parse::<T>().unwrap_or_else(|_| {
            error!("🪛️ {s} is not a valid value for {var}. Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

//------------------------------------    CommissionQuote    -------------------------------------------------------
/// The outcome of a commission calculation. `rate` is only recorded for the percentage tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionQuote {
    pub amount: Money,
    pub tier: CommissionTier,
    pub rate: Option<f64>,
}

/// Computes the commission owed by `profile`'s master for winning an order of `order_amount`.
///
/// The enrollment window is measured in whole calendar months: a master enrolled on the 31st of January is on the
/// percentage tier from the 1st of February. See `whole_months_between` for the exact rule.
///
/// Fails with [`AuctionError::InvalidAmount`] if `order_amount` is not positive.
pub fn compute_commission(
    profile: &MasterProfile,
    order_amount: Money,
    now: DateTime<Utc>,
    config: &CommissionConfig,
) -> Result<CommissionQuote, AuctionError> {
    if !order_amount.is_positive() {
        return Err(AuctionError::InvalidAmount(order_amount));
    }
    let months = whole_months_between(profile.enrolled_at, now);
    let in_first_month = months == 0 && profile.first_month_orders < i64::from(config.flat_fee_cap);
    let quote = if in_first_month {
        trace!(
            "🧮️ Master [{}] is on the first-month tier (order {} of {})",
            profile.master_id,
            profile.first_month_orders + 1,
            config.flat_fee_cap
        );
        CommissionQuote { amount: config.flat_fee, tier: CommissionTier::FirstMonth, rate: None }
    } else {
        let amount = order_amount.percent_of(config.percentage_rate);
        trace!(
            "🧮️ Master [{}] owes {amount} on the percentage tier ({} × {})",
            profile.master_id,
            order_amount,
            config.percentage_rate
        );
        CommissionQuote { amount, tier: CommissionTier::Percentage, rate: Some(config.percentage_rate) }
    };
    Ok(quote)
}

/// The number of whole calendar months between `from` and `to`, clamped at zero.
///
/// This is a pure year/month difference: the day of month is ignored, so the window always closes at the first
/// midnight of the following calendar month regardless of when in the month the master enrolled.
fn whole_months_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i32 {
    let from_months = from.year() * 12 + from.month0() as i32;
    let to_months = to.year() * 12 + to.month0() as i32;
    (to_months - from_months).max(0)
}
