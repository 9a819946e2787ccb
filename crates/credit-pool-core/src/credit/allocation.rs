//! Payment allocation: how much of a payment goes to principal, interest and
//! fees, and whether it settles the period or the whole credit.
//!
//! Allocation is pure. It reads a [`CreditRecord`] and returns the split;
//! applying the split is the lifecycle controller's job. That lets the same
//! computation back payoff quotes and previews.
//!
//! A payment is classified against two thresholds:
//!
//! - `due_amount`: interest and fees billed for the period, plus any late
//!   fee, plus the principal portion billed for the period.
//! - `payoff_amount`: interest, fees and late fee, plus all remaining
//!   principal, plus the early-payoff fee when paying off before the final
//!   period.
//!
//! Anything below `due_amount` is a no-op (no partial credit). Anything at or
//! above `payoff_amount` closes the credit and the excess is not allocated.
//! In between, the extra over `due_amount` prepays principal, leaving at least
//! one unit outstanding so the credit is only ever closed through payoff.
//! When the period's bill already covers all remaining principal (the final
//! period, or a schedule that has caught up) both thresholds coincide and no
//! early-payoff fee applies.

use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::credit::record::CreditRecord;
use crate::error::CreditPoolError;
use crate::fees::FeeSchedule;
use crate::types::{Money, Timestamp};
use crate::CreditPoolResult;

/// Result of allocating a payment amount against a credit record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub principal_paid: Money,
    pub interest_paid: Money,
    pub fees_paid: Money,
    pub is_late: bool,
    /// The payment settles the current period.
    pub mark_paid: bool,
    /// The payment settles the credit entirely.
    pub paid_off: bool,
}

impl PaymentAllocation {
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn is_noop(&self) -> bool {
        !self.mark_paid
    }

    /// Amount actually taken from the borrower.
    pub fn total_applied(&self) -> Money {
        self.principal_paid + self.interest_paid + self.fees_paid
    }

    /// Interest and fees: the part of the payment that is pool income.
    pub fn income(&self) -> Money {
        self.interest_paid + self.fees_paid
    }
}

/// Amounts a borrower owes right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueBreakdown {
    pub interest_due: Money,
    pub late_fee: Money,
    pub principal_due: Money,
    pub early_payoff_fee: Money,
    pub is_late: bool,
    /// Minimum amount that settles the current period.
    pub due_amount: Money,
    /// Amount that settles the credit entirely.
    pub payoff_amount: Money,
}

/// Late fee applies once per missed due date: only when the due date has
/// passed and no late fee has been charged since it.
pub fn is_late(record: &CreditRecord, last_late_fee_date: Timestamp, now: Timestamp) -> bool {
    record.is_past_due(now) && last_late_fee_date < record.due_date
}

/// Compute the current dues of `record` at `now`.
pub fn due_breakdown(
    record: &CreditRecord,
    last_late_fee_date: Timestamp,
    now: Timestamp,
    fees: &FeeSchedule,
) -> DueBreakdown {
    let interest_due = record.fees_and_interest_due;
    let late = is_late(record, last_late_fee_date, now);
    let late_fee = if late {
        fees.compute_late_fee(record.total_due)
    } else {
        Decimal::ZERO
    };

    let clears_principal =
        record.is_final_period() || record.principal_due() >= record.remaining_principal;
    let early_payoff_fee = if clears_principal {
        Decimal::ZERO
    } else {
        fees.compute_early_payoff_fee(record.remaining_principal)
    };

    let payoff_amount = interest_due + late_fee + record.remaining_principal + early_payoff_fee;
    let (principal_due, due_amount) = if clears_principal {
        (record.remaining_principal, payoff_amount)
    } else {
        let principal_due = record.principal_due();
        (principal_due, interest_due + late_fee + principal_due)
    };

    DueBreakdown {
        interest_due,
        late_fee,
        principal_due,
        early_payoff_fee,
        is_late: late,
        due_amount,
        payoff_amount,
    }
}

/// Allocate `payment_amount` against `record` at `now`.
pub fn next_payment(
    record: &CreditRecord,
    last_late_fee_date: Timestamp,
    payment_amount: Money,
    now: Timestamp,
    fees: &FeeSchedule,
) -> CreditPoolResult<PaymentAllocation> {
    if payment_amount < Decimal::ZERO {
        return Err(CreditPoolError::InvalidInput {
            field: "payment_amount".into(),
            reason: "Payment amount must be non-negative".into(),
        });
    }

    if record.remaining_principal.is_zero() && record.fees_and_interest_due.is_zero() {
        return Ok(PaymentAllocation::noop());
    }

    let due = due_breakdown(record, last_late_fee_date, now, fees);

    if payment_amount.is_zero() || payment_amount < due.due_amount {
        debug!(
            "payment {} below due amount {} for {}: no-op",
            payment_amount, due.due_amount, record.borrower_id
        );
        return Ok(PaymentAllocation::noop());
    }

    let allocation = if payment_amount >= due.payoff_amount {
        PaymentAllocation {
            principal_paid: record.remaining_principal,
            interest_paid: due.interest_due,
            fees_paid: due.late_fee + due.early_payoff_fee,
            is_late: due.is_late,
            mark_paid: true,
            paid_off: true,
        }
    } else {
        let extra = payment_amount - due.due_amount;
        // Short of payoff, one unit of principal stays outstanding.
        let prepay_room = record.remaining_principal - due.principal_due - Decimal::ONE;
        let prepaid = extra.min(prepay_room).max(Decimal::ZERO);
        PaymentAllocation {
            principal_paid: due.principal_due + prepaid,
            interest_paid: due.interest_due,
            fees_paid: due.late_fee,
            is_late: due.is_late,
            mark_paid: true,
            paid_off: false,
        }
    };

    debug!(
        "allocated {} for {}: principal={} interest={} fees={} late={} paid_off={}",
        payment_amount,
        record.borrower_id,
        allocation.principal_paid,
        allocation.interest_paid,
        allocation.fees_paid,
        allocation.is_late,
        allocation.paid_off
    );

    Ok(allocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::record::{CreditState, CreditType};
    use rust_decimal_macros::dec;

    const DUE: Timestamp = 1_700_000_000;

    /// Interest-only record, first period: principal 400, interest 4.
    fn io_record() -> CreditRecord {
        let mut cr = CreditRecord::requested("borrower", dec!(400), 1200, 30, 12, CreditType::InterestOnly);
        cr.remaining_principal = dec!(400);
        cr.unbilled_principal = dec!(400);
        cr.fees_and_interest_due = dec!(4);
        cr.total_due = dec!(4);
        cr.due_date = DUE;
        cr.state = CreditState::GoodStanding;
        cr
    }

    fn late_fees() -> FeeSchedule {
        FeeSchedule::from_set_fees_args(&[dec!(10), dec!(100), dec!(20), dec!(10000)]).unwrap()
    }

    fn alloc(
        principal: Money,
        interest: Money,
        fees: Money,
        is_late: bool,
        mark_paid: bool,
        paid_off: bool,
    ) -> PaymentAllocation {
        PaymentAllocation {
            principal_paid: principal,
            interest_paid: interest,
            fees_paid: fees,
            is_late,
            mark_paid,
            paid_off,
        }
    }

    fn pay(cr: &CreditRecord, amount: Money, now: Timestamp, fees: &FeeSchedule) -> PaymentAllocation {
        next_payment(cr, 0, amount, now, fees).unwrap()
    }

    #[test]
    fn test_first_payment_boundaries_on_time() {
        let cr = io_record();
        let fees = late_fees();
        let now = DUE - 100;
        assert_eq!(pay(&cr, dec!(3), now, &fees), PaymentAllocation::noop());
        assert_eq!(pay(&cr, dec!(4), now, &fees), alloc(dec!(0), dec!(4), dec!(0), false, true, false));
        assert_eq!(pay(&cr, dec!(10), now, &fees), alloc(dec!(6), dec!(4), dec!(0), false, true, false));
        assert_eq!(pay(&cr, dec!(404), now, &fees), alloc(dec!(400), dec!(4), dec!(0), false, true, true));
        assert_eq!(pay(&cr, dec!(500), now, &fees), alloc(dec!(400), dec!(4), dec!(0), false, true, true));
    }

    #[test]
    fn test_late_payment_adds_flat_plus_bps_fee() {
        let cr = io_record();
        let fees = late_fees();
        let now = DUE + 30 * 86_400;
        assert_eq!(pay(&cr, dec!(27), now, &fees), PaymentAllocation::noop());
        assert_eq!(pay(&cr, dec!(28), now, &fees), alloc(dec!(0), dec!(4), dec!(24), true, true, false));
        assert_eq!(pay(&cr, dec!(30), now, &fees), alloc(dec!(2), dec!(4), dec!(24), true, true, false));
        assert_eq!(pay(&cr, dec!(428), now, &fees), alloc(dec!(400), dec!(4), dec!(24), true, true, true));
    }

    #[test]
    fn test_late_fee_charged_once_per_due_date() {
        let cr = io_record();
        let fees = late_fees();
        let now = DUE + 10;
        // Late fee already assessed after this due date.
        let first = next_payment(&cr, DUE + 5, dec!(28), now, &fees).unwrap();
        let second = next_payment(&cr, DUE + 5, dec!(28), now, &fees).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_late);
        assert_eq!(first.fees_paid, dec!(0));
        assert_eq!(first.principal_paid, dec!(24));
    }

    #[test]
    fn test_zero_payment_is_noop_even_when_late() {
        let cr = io_record();
        let result = pay(&cr, dec!(0), DUE + 1, &late_fees());
        assert_eq!(result, PaymentAllocation::noop());
        assert!(result.is_noop());
    }

    #[test]
    fn test_final_period_requires_full_payoff() {
        let mut cr = io_record();
        cr.remaining_periods = 1;
        cr.total_due = dec!(404);
        cr.unbilled_principal = dec!(0);
        let fees = late_fees();
        let now = DUE - 1;
        assert_eq!(pay(&cr, dec!(4), now, &fees), PaymentAllocation::noop());
        assert_eq!(pay(&cr, dec!(403), now, &fees), PaymentAllocation::noop());
        assert_eq!(pay(&cr, dec!(404), now, &fees), alloc(dec!(400), dec!(4), dec!(0), false, true, true));
    }

    #[test]
    fn test_final_period_without_billed_principal_still_requires_payoff() {
        let mut cr = io_record();
        cr.remaining_periods = 1;
        assert_eq!(pay(&cr, dec!(10), DUE - 1, &late_fees()), PaymentAllocation::noop());
    }

    #[test]
    fn test_early_payoff_fee_raises_payoff_threshold() {
        let cr = io_record();
        let fees = FeeSchedule::from_set_fees_args(&[dec!(0), dec!(0), dec!(0), dec!(0), dec!(5), dec!(100)])
            .unwrap();
        let now = DUE - 1;
        // early payoff fee = 5 + 1% of 400 = 9; payoff = 4 + 400 + 9
        assert_eq!(pay(&cr, dec!(413), now, &fees), alloc(dec!(400), dec!(4), dec!(9), false, true, true));
        // below the principal it prepays normally
        assert_eq!(pay(&cr, dec!(103), now, &fees), alloc(dec!(99), dec!(4), dec!(0), false, true, false));
        // short of the fee, prepayment stops one unit before the principal
        for amount in [dec!(403), dec!(404), dec!(410), dec!(412)] {
            assert_eq!(pay(&cr, amount, now, &fees), alloc(dec!(399), dec!(4), dec!(0), false, true, false));
        }
    }

    #[test]
    fn test_principal_paid_never_drops_as_amount_grows() {
        let cr = io_record();
        let fees = FeeSchedule::from_set_fees_args(&[dec!(0), dec!(0), dec!(0), dec!(0), dec!(5), dec!(100)])
            .unwrap();
        let mut last = Decimal::ZERO;
        for amount in 4..=420 {
            let paid = pay(&cr, Decimal::from(amount), DUE - 1, &fees).principal_paid;
            assert!(paid >= last, "principal fell at {amount}: {paid} < {last}");
            last = paid;
        }
        assert_eq!(last, dec!(400));
    }

    #[test]
    fn test_bill_covering_all_principal_is_a_payoff() {
        // Billed principal equals the remaining principal before the final period.
        let mut cr = io_record();
        cr.remaining_periods = 3;
        cr.total_due = dec!(404);
        cr.unbilled_principal = dec!(0);
        let fees = FeeSchedule::from_set_fees_args(&[dec!(0), dec!(0), dec!(0), dec!(0), dec!(5), dec!(0)])
            .unwrap();
        let due = due_breakdown(&cr, 0, DUE - 1, &fees);
        assert_eq!(due.early_payoff_fee, dec!(0));
        assert_eq!(due.due_amount, due.payoff_amount);
        assert_eq!(pay(&cr, dec!(403), DUE - 1, &fees), PaymentAllocation::noop());
        assert_eq!(pay(&cr, dec!(404), DUE - 1, &fees), alloc(dec!(400), dec!(4), dec!(0), false, true, true));
    }

    #[test]
    fn test_billed_principal_is_part_of_due_amount() {
        let mut cr = io_record();
        cr.total_due = dec!(24); // 4 interest + 20 principal
        let fees = FeeSchedule::default();
        let now = DUE - 1;
        assert_eq!(pay(&cr, dec!(23), now, &fees), PaymentAllocation::noop());
        assert_eq!(pay(&cr, dec!(24), now, &fees), alloc(dec!(20), dec!(4), dec!(0), false, true, false));
        assert_eq!(pay(&cr, dec!(30), now, &fees), alloc(dec!(26), dec!(4), dec!(0), false, true, false));
        assert_eq!(pay(&cr, dec!(404), now, &fees), alloc(dec!(400), dec!(4), dec!(0), false, true, true));
    }

    #[test]
    fn test_empty_record_is_noop() {
        let cr = CreditRecord::requested("b", dec!(100), 0, 30, 1, CreditType::InterestOnly);
        assert_eq!(pay(&cr, dec!(50), 0, &FeeSchedule::default()), PaymentAllocation::noop());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let err = next_payment(&io_record(), 0, dec!(-1), DUE, &FeeSchedule::default()).unwrap_err();
        assert!(matches!(err, CreditPoolError::InvalidInput { .. }));
    }

    #[test]
    fn test_allocation_does_not_touch_record() {
        let cr = io_record();
        let before = cr.clone();
        for amount in [dec!(0), dec!(3), dec!(10), dec!(500)] {
            let _ = pay(&cr, amount, DUE + 1, &late_fees());
        }
        assert_eq!(cr, before);
    }

    #[test]
    fn test_due_breakdown_totals() {
        let due = due_breakdown(&io_record(), 0, DUE + 1, &late_fees());
        assert!(due.is_late);
        assert_eq!(due.late_fee, dec!(24));
        assert_eq!(due.due_amount, dec!(28));
        assert_eq!(due.payoff_amount, dec!(428));
    }
}
