//! Flat + basis-point fee schedule for origination, late payment and early
//! payoff.
//!
//! Every fee is `flat + trunc(bps * base / 10000)`: the bps component is
//! truncated toward zero, so rounding always favours the pool.

use std::time::Instant;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CreditPoolError;
use crate::types::{apply_bps, with_metadata, Bps, ComputationOutput, Money, MAX_BPS};
use crate::CreditPoolResult;

/// Pool fee parameters. Set at pool configuration time and read-only during
/// payment processing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    #[serde(default)]
    pub origination_flat: Money,
    #[serde(default)]
    pub origination_bps: Bps,
    #[serde(default)]
    pub late_fee_flat: Money,
    #[serde(default)]
    pub late_fee_bps: Bps,
    #[serde(default)]
    pub early_payoff_flat: Money,
    #[serde(default)]
    pub early_payoff_bps: Bps,
    /// Minimum share of the outstanding principal billed each period on
    /// interest-only credit.
    #[serde(default)]
    pub min_principal_rate_bps: Bps,
}

impl FeeSchedule {
    /// Build a validated schedule.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        origination_flat: Money,
        origination_bps: Bps,
        late_fee_flat: Money,
        late_fee_bps: Bps,
        early_payoff_flat: Money,
        early_payoff_bps: Bps,
        min_principal_rate_bps: Bps,
    ) -> CreditPoolResult<Self> {
        let schedule = Self {
            origination_flat,
            origination_bps,
            late_fee_flat,
            late_fee_bps,
            early_payoff_flat,
            early_payoff_bps,
            min_principal_rate_bps,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Build a schedule from the positional `setFees` argument list.
    ///
    /// Accepted forms:
    /// - 4 args: `origination_flat, origination_bps, late_fee_flat, late_fee_bps`
    /// - 5 args: the above plus `early_payoff_flat`
    /// - 6 args: the above plus `early_payoff_bps`
    pub fn from_set_fees_args(args: &[Money]) -> CreditPoolResult<Self> {
        if !(4..=6).contains(&args.len()) {
            return Err(CreditPoolError::InvalidInput {
                field: "fees".into(),
                reason: format!("expected 4, 5 or 6 values, got {}", args.len()),
            });
        }

        let mut schedule = FeeSchedule {
            origination_flat: flat_arg("origination_flat", args[0])?,
            origination_bps: bps_arg("origination_bps", args[1])?,
            late_fee_flat: flat_arg("late_fee_flat", args[2])?,
            late_fee_bps: bps_arg("late_fee_bps", args[3])?,
            ..Default::default()
        };
        if let Some(v) = args.get(4) {
            schedule.early_payoff_flat = flat_arg("early_payoff_flat", *v)?;
        }
        if let Some(v) = args.get(5) {
            schedule.early_payoff_bps = bps_arg("early_payoff_bps", *v)?;
        }
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn with_min_principal_rate(mut self, bps: Bps) -> CreditPoolResult<Self> {
        self.min_principal_rate_bps = bps;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> CreditPoolResult<()> {
        for (field, value) in [
            ("origination_bps", self.origination_bps),
            ("late_fee_bps", self.late_fee_bps),
            ("early_payoff_bps", self.early_payoff_bps),
            ("min_principal_rate_bps", self.min_principal_rate_bps),
        ] {
            if value > MAX_BPS {
                return Err(CreditPoolError::InvalidFeeConfig {
                    field: field.into(),
                    value: u64::from(value),
                });
            }
        }
        for (field, value) in [
            ("origination_flat", self.origination_flat),
            ("late_fee_flat", self.late_fee_flat),
            ("early_payoff_flat", self.early_payoff_flat),
        ] {
            if value < Decimal::ZERO {
                return Err(CreditPoolError::InvalidInput {
                    field: field.into(),
                    reason: "Flat fee must be non-negative".into(),
                });
            }
        }
        Ok(())
    }

    pub fn compute_origination_fee(&self, principal: Money) -> Money {
        self.origination_flat + apply_bps(principal, self.origination_bps)
    }

    pub fn compute_late_fee(&self, overdue_amount: Money) -> Money {
        self.late_fee_flat + apply_bps(overdue_amount, self.late_fee_bps)
    }

    pub fn compute_early_payoff_fee(&self, remaining_principal: Money) -> Money {
        self.early_payoff_flat + apply_bps(remaining_principal, self.early_payoff_bps)
    }

    pub fn compute_min_principal_due(&self, remaining_principal: Money) -> Money {
        apply_bps(remaining_principal, self.min_principal_rate_bps)
    }
}

// ---------------------------------------------------------------------------
// Fee quote
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeQuoteInput {
    pub fees: FeeSchedule,
    pub principal: Money,
    /// Amount a late fee would be charged on. Defaults to `principal`.
    #[serde(default)]
    pub overdue_amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    pub origination_fee: Money,
    pub net_proceeds: Money,
    pub late_fee: Money,
    pub early_payoff_fee: Money,
    pub min_principal_due: Money,
}

/// Every fee the schedule would charge against `principal`.
pub fn quote_fees(input: &FeeQuoteInput) -> CreditPoolResult<ComputationOutput<FeeQuote>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.fees.validate()?;
    if input.principal < Decimal::ZERO {
        return Err(CreditPoolError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be non-negative".into(),
        });
    }
    if input.principal != input.principal.trunc() {
        warnings.push("Principal has a fractional part; fees are computed on whole units".into());
    }

    let principal = input.principal.trunc();
    let overdue = input.overdue_amount.unwrap_or(principal);
    let origination_fee = input.fees.compute_origination_fee(principal);
    if origination_fee >= principal && !principal.is_zero() {
        warnings.push(format!(
            "Origination fee {origination_fee} consumes the whole principal"
        ));
    }

    let result = FeeQuote {
        origination_fee,
        net_proceeds: (principal - origination_fee).max(Decimal::ZERO),
        late_fee: input.fees.compute_late_fee(overdue),
        early_payoff_fee: input.fees.compute_early_payoff_fee(principal),
        min_principal_due: input.fees.compute_min_principal_due(principal),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Flat plus truncated basis-point fees",
        &serde_json::json!({
            "principal": principal.to_string(),
            "overdue_amount": overdue.to_string(),
        }),
        warnings,
        elapsed,
        result,
    ))
}

fn flat_arg(field: &str, value: Money) -> CreditPoolResult<Money> {
    if value < Decimal::ZERO {
        return Err(CreditPoolError::InvalidInput {
            field: field.into(),
            reason: "Flat fee must be non-negative".into(),
        });
    }
    Ok(value.trunc())
}

fn bps_arg(field: &str, value: Money) -> CreditPoolResult<Bps> {
    if value < Decimal::ZERO || value != value.trunc() {
        return Err(CreditPoolError::InvalidInput {
            field: field.into(),
            reason: "Basis points must be a non-negative integer".into(),
        });
    }
    match value.to_u32() {
        Some(bps) if bps <= MAX_BPS => Ok(bps),
        _ => Err(CreditPoolError::InvalidFeeConfig {
            field: field.into(),
            value: value.to_u64().unwrap_or(u64::MAX),
        }),
    }
}
