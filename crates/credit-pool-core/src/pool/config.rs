use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CreditPoolError;
use crate::types::{days_to_seconds, Bps, Money, MAX_BPS};
use crate::CreditPoolResult;

/// Pool-level lending parameters, set by the pool owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub min_borrow: Money,
    pub max_credit_line: Money,
    pub apr_bps: Bps,
    pub payment_interval_days: u32,
    /// Days past a missed due date before default may be triggered.
    pub default_grace_period_days: u32,
    /// Share of fee and interest income routed to the protocol treasury.
    #[serde(default)]
    pub protocol_fee_bps: Bps,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl PoolConfig {
    pub fn validate(&self) -> CreditPoolResult<()> {
        if self.min_borrow < Decimal::ZERO {
            return Err(CreditPoolError::InvalidInput {
                field: "min_borrow".into(),
                reason: "Minimum borrow must be non-negative".into(),
            });
        }
        if self.max_credit_line <= Decimal::ZERO {
            return Err(CreditPoolError::InvalidInput {
                field: "max_credit_line".into(),
                reason: "Maximum credit line must be positive".into(),
            });
        }
        if self.min_borrow > self.max_credit_line {
            return Err(CreditPoolError::InvalidInput {
                field: "min_borrow".into(),
                reason: "Minimum borrow cannot exceed maximum credit line".into(),
            });
        }
        if self.payment_interval_days == 0 {
            return Err(CreditPoolError::InvalidInput {
                field: "payment_interval_days".into(),
                reason: "Payment interval must be at least 1 day".into(),
            });
        }
        if self.protocol_fee_bps > MAX_BPS {
            return Err(CreditPoolError::InvalidFeeConfig {
                field: "protocol_fee_bps".into(),
                value: u64::from(self.protocol_fee_bps),
            });
        }
        Ok(())
    }

    pub fn grace_period_seconds(&self) -> i64 {
        days_to_seconds(self.default_grace_period_days)
    }

    pub fn check_amount(&self, amount: Money) -> CreditPoolResult<()> {
        if amount < self.min_borrow || amount > self.max_credit_line {
            return Err(CreditPoolError::AmountOutOfRange {
                amount,
                min: self.min_borrow,
                max: self.max_credit_line,
            });
        }
        Ok(())
    }
}

/// Protocol-wide switches shared by every pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default)]
    pub paused: bool,
}
