//! Borrower-facing quotes: origination cost and repayment schedule for a
//! prospective credit, payoff amounts and payment previews for an existing
//! one. Every function is read-only and returns the standard computation
//! envelope.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::credit::allocation::{due_breakdown, next_payment, DueBreakdown, PaymentAllocation};
use crate::credit::billing::bill_period;
use crate::credit::record::{CreditRecord, CreditState, CreditType};
use crate::error::CreditPoolError;
use crate::fees::{FeeSchedule, FixedPaymentTable};
use crate::time_value::irr;
use crate::types::{with_metadata, Bps, ComputationOutput, Money, Rate, Timestamp, DAYS_PER_YEAR};
use crate::CreditPoolResult;

const MONTHLY_INTERVAL_DAYS: u32 = 30;
const IRR_GUESS: Decimal = dec!(0.01);

/// Terms of a prospective credit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteInput {
    pub principal: Money,
    pub apr_bps: Bps,
    pub payment_interval_days: u32,
    pub num_periods: u32,
    #[serde(default)]
    pub credit_type: CreditType,
    #[serde(default)]
    pub fees: FeeSchedule,
    /// Required for fixed-payment credit.
    #[serde(default)]
    pub fixed_payments: FixedPaymentTable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub period: u32,
    pub beginning_balance: Money,
    pub interest: Money,
    pub principal: Money,
    pub payment: Money,
    pub ending_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditQuote {
    pub origination_fee: Money,
    pub net_proceeds: Money,
    pub schedule: Vec<ScheduledPayment>,
    pub total_interest: Money,
    /// Interest plus origination fee.
    pub total_cost: Money,
    /// IRR of net proceeds against scheduled payments, per period.
    pub effective_periodic_rate: Rate,
    /// Periodic rate times periods per year.
    pub effective_apr: Rate,
}

/// Input for previewing a payment against an existing record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextPaymentInput {
    pub record: CreditRecord,
    #[serde(default)]
    pub last_late_fee_date: Timestamp,
    pub payment_amount: Money,
    pub now: Timestamp,
    #[serde(default)]
    pub fees: FeeSchedule,
}

/// Input for quoting what an existing record owes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffInput {
    pub record: CreditRecord,
    #[serde(default)]
    pub last_late_fee_date: Timestamp,
    pub now: Timestamp,
    #[serde(default)]
    pub fees: FeeSchedule,
}

/// Quote origination fee, repayment schedule and effective rate.
pub fn quote_credit(input: &QuoteInput) -> CreditPoolResult<ComputationOutput<CreditQuote>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_quote_input(input)?;

    let origination_fee = input.fees.compute_origination_fee(input.principal);
    let net_proceeds = input.principal - origination_fee;
    if net_proceeds <= Decimal::ZERO {
        return Err(CreditPoolError::InvalidInput {
            field: "fees".into(),
            reason: "Origination fee consumes the whole principal".into(),
        });
    }

    let mut record = CreditRecord::requested(
        "quote",
        input.principal,
        input.apr_bps,
        input.payment_interval_days,
        input.num_periods,
        input.credit_type,
    );
    record.remaining_principal = input.principal;
    record.state = CreditState::GoodStanding;

    if input.credit_type == CreditType::FixedPayment {
        if input.payment_interval_days != MONTHLY_INTERVAL_DAYS {
            warnings.push(format!(
                "Fixed-payment installments are monthly; interval of {} days ignored for interest",
                input.payment_interval_days
            ));
        }
        record.fixed_installment = input.fixed_payments.get_fixed_payment_amount(
            input.principal,
            input.apr_bps,
            input.num_periods,
        )?;
    }

    let mut schedule: Vec<ScheduledPayment> = Vec::with_capacity(input.num_periods as usize);
    for period in 1..=input.num_periods {
        let beginning_balance = record.remaining_principal;
        bill_period(&mut record, &input.fees);
        let principal = record.principal_due();
        let interest = record.fees_and_interest_due;
        record.remaining_principal -= principal;
        record.remaining_periods -= 1;
        schedule.push(ScheduledPayment {
            period,
            beginning_balance,
            interest,
            principal,
            payment: interest + principal,
            ending_balance: record.remaining_principal,
        });
    }

    let total_interest: Money = schedule.iter().map(|p| p.interest).sum();
    let total_cost = total_interest + origination_fee;

    let mut cash_flows: Vec<Money> = Vec::with_capacity(schedule.len() + 1);
    cash_flows.push(-net_proceeds);
    cash_flows.extend(schedule.iter().map(|p| p.payment));
    let effective_periodic_rate = match irr(&cash_flows, IRR_GUESS) {
        Ok(rate) => rate,
        Err(e) => {
            warnings.push(format!("Effective rate unavailable: {e}"));
            Decimal::ZERO
        }
    };
    let periods_per_year =
        Decimal::from(DAYS_PER_YEAR) / Decimal::from(input.payment_interval_days);
    let effective_apr = effective_periodic_rate * periods_per_year;

    let output = CreditQuote {
        origination_fee,
        net_proceeds,
        schedule,
        total_interest,
        total_cost,
        effective_periodic_rate,
        effective_apr,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Credit quote: origination fee, billing schedule, IRR-based effective rate",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "apr_bps": input.apr_bps,
            "payment_interval_days": input.payment_interval_days,
            "num_periods": input.num_periods,
            "credit_type": input.credit_type,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Preview how a payment would be allocated, without applying it.
pub fn preview_next_payment(
    input: &NextPaymentInput,
) -> CreditPoolResult<ComputationOutput<PaymentAllocation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let allocation = next_payment(
        &input.record,
        input.last_late_fee_date,
        input.payment_amount,
        input.now,
        &input.fees,
    )?;

    if allocation.is_noop() && !input.payment_amount.is_zero() {
        let due = due_breakdown(&input.record, input.last_late_fee_date, input.now, &input.fees);
        warnings.push(format!(
            "Payment {} is below the amount due {}; nothing would be applied",
            input.payment_amount, due.due_amount
        ));
    }
    let unapplied = input.payment_amount - allocation.total_applied();
    if allocation.paid_off && unapplied > Decimal::ZERO {
        warnings.push(format!("{unapplied} above the payoff amount would not be applied"));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Payment allocation: due vs payoff thresholds, late fee once per due date",
        &serde_json::json!({
            "borrower_id": input.record.borrower_id,
            "payment_amount": input.payment_amount.to_string(),
            "now": input.now,
            "due_date": input.record.due_date,
        }),
        warnings,
        elapsed,
        allocation,
    ))
}

/// What the record owes now: period due amount and full payoff amount.
pub fn quote_payoff(input: &PayoffInput) -> CreditPoolResult<ComputationOutput<DueBreakdown>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if !input.record.state.is_active() {
        warnings.push(format!(
            "Credit is {}; amounts reflect the stored balances only",
            input.record.state
        ));
    }

    let due = due_breakdown(&input.record, input.last_late_fee_date, input.now, &input.fees);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Payoff quote: interest, late fee, remaining principal, early-payoff fee",
        &serde_json::json!({
            "borrower_id": input.record.borrower_id,
            "now": input.now,
        }),
        warnings,
        elapsed,
        due,
    ))
}

fn validate_quote_input(input: &QuoteInput) -> CreditPoolResult<()> {
    if input.principal <= Decimal::ZERO {
        return Err(CreditPoolError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if input.num_periods == 0 {
        return Err(CreditPoolError::InvalidInput {
            field: "num_periods".into(),
            reason: "At least one period is required".into(),
        });
    }
    if input.payment_interval_days == 0 {
        return Err(CreditPoolError::InvalidInput {
            field: "payment_interval_days".into(),
            reason: "Payment interval must be at least 1 day".into(),
        });
    }
    input.fees.validate()
}
