//! Per-period billing: what a credit record owes for its current period.

use rust_decimal::Decimal;

use crate::credit::record::{CreditRecord, CreditState, CreditType};
use crate::fees::FeeSchedule;
use crate::types::{Money, Timestamp, BPS_DENOMINATOR, DAYS_PER_YEAR, MONTHS_PER_YEAR};

/// Interest accrued on `principal` over one period of the record's terms.
pub fn period_interest(record: &CreditRecord, principal: Money) -> Money {
    let apr = Decimal::from(record.apr_bps);
    let bps = Decimal::from(BPS_DENOMINATOR);
    match record.credit_type {
        CreditType::InterestOnly => {
            let days = Decimal::from(record.payment_interval_days);
            (principal * apr * days / (bps * Decimal::from(DAYS_PER_YEAR))).trunc()
        }
        CreditType::FixedPayment => {
            (principal * apr / (bps * Decimal::from(MONTHS_PER_YEAR))).trunc()
        }
    }
}

/// Principal billed for the current period.
pub fn period_principal(record: &CreditRecord, interest: Money, fees: &FeeSchedule) -> Money {
    let remaining = record.remaining_principal;
    if record.is_final_period() {
        return remaining;
    }
    let scheduled = match record.credit_type {
        CreditType::InterestOnly => fees.compute_min_principal_due(remaining),
        CreditType::FixedPayment => (record.fixed_installment - interest).max(Decimal::ZERO),
    };
    scheduled.min(remaining)
}

/// Recompute `fees_and_interest_due`, `total_due` and `unbilled_principal`
/// for the current period.
pub fn bill_period(record: &mut CreditRecord, fees: &FeeSchedule) {
    let interest = period_interest(record, record.remaining_principal);
    let principal = period_principal(record, interest, fees);
    record.fees_and_interest_due = interest;
    record.total_due = interest + principal;
    record.unbilled_principal = record.remaining_principal - principal;
}

/// Whole or partial intervals elapsed since the due date.
pub fn missed_periods(record: &CreditRecord, now: Timestamp) -> u32 {
    if !record.is_past_due(now) {
        return 0;
    }
    let interval = record.interval_seconds();
    if interval <= 0 {
        return 1;
    }
    let overdue = now - record.due_date;
    let periods = (overdue + interval - 1) / interval;
    u32::try_from(periods).unwrap_or(u32::MAX)
}

/// Move a past-due active record to Delayed and count its missed periods.
/// Returns the previous state when the state changed.
pub fn refresh_due_info(record: &mut CreditRecord, now: Timestamp) -> Option<CreditState> {
    if !record.state.is_active() || !record.is_past_due(now) {
        return None;
    }
    record.missed_periods = missed_periods(record, now);
    let old = record.state;
    if old == CreditState::Delayed {
        return None;
    }
    record.state = CreditState::Delayed;
    Some(old)
}
