use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{days_to_seconds, Bps, BorrowerId, Money, Timestamp};

/// Lifecycle stage of a credit record.
///
/// Codes 0-3 match the values external tooling asserts on; the active and
/// terminal stages that follow a drawdown are numbered after them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CreditState {
    #[default]
    Deleted = 0,
    Requested = 1,
    Approved = 2,
    Closed = 3,
    GoodStanding = 4,
    Delayed = 5,
    Defaulted = 6,
}

impl CreditState {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Drawn down and not yet closed or defaulted.
    pub fn is_active(self) -> bool {
        matches!(self, CreditState::GoodStanding | CreditState::Delayed)
    }

    /// A borrower in this state may open a new request.
    pub fn is_available_for_request(self) -> bool {
        matches!(self, CreditState::Deleted | CreditState::Closed)
    }
}

impl fmt::Display for CreditState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CreditState::Deleted => "Deleted",
            CreditState::Requested => "Requested",
            CreditState::Approved => "Approved",
            CreditState::Closed => "Closed",
            CreditState::GoodStanding => "GoodStanding",
            CreditState::Delayed => "Delayed",
            CreditState::Defaulted => "Defaulted",
        };
        write!(f, "{name}")
    }
}

/// Repayment profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditType {
    /// Interest (plus any minimum principal) each period, principal at the end.
    #[default]
    InterestOnly,
    /// Level monthly installment from the registered fixed-payment table.
    FixedPayment,
}

/// Per-borrower ledger of balances, due dates and lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditRecord {
    pub borrower_id: BorrowerId,
    pub credit_limit: Money,
    pub remaining_principal: Money,
    /// Principal not billed in the current period.
    pub unbilled_principal: Money,
    pub fees_and_interest_due: Money,
    /// Interest and fees plus the principal portion due this period.
    pub total_due: Money,
    pub apr_bps: Bps,
    pub payment_interval_days: u32,
    pub remaining_periods: u32,
    pub missed_periods: u32,
    pub due_date: Timestamp,
    pub last_late_fee_date: Timestamp,
    pub state: CreditState,
    #[serde(default)]
    pub credit_type: CreditType,
    #[serde(default)]
    pub fixed_installment: Money,
}

impl CreditRecord {
    /// A fresh request with no balances.
    pub fn requested(
        borrower_id: impl Into<BorrowerId>,
        credit_limit: Money,
        apr_bps: Bps,
        payment_interval_days: u32,
        num_periods: u32,
        credit_type: CreditType,
    ) -> Self {
        Self {
            borrower_id: borrower_id.into(),
            credit_limit,
            remaining_principal: Decimal::ZERO,
            unbilled_principal: Decimal::ZERO,
            fees_and_interest_due: Decimal::ZERO,
            total_due: Decimal::ZERO,
            apr_bps,
            payment_interval_days,
            remaining_periods: num_periods,
            missed_periods: 0,
            due_date: 0,
            last_late_fee_date: 0,
            state: CreditState::Requested,
            credit_type,
            fixed_installment: Decimal::ZERO,
        }
    }

    /// Principal portion of `total_due`, clamped to `[0, remaining_principal]`.
    pub fn principal_due(&self) -> Money {
        (self.total_due - self.fees_and_interest_due)
            .max(Decimal::ZERO)
            .min(self.remaining_principal)
    }

    pub fn is_final_period(&self) -> bool {
        self.remaining_periods <= 1
    }

    pub fn interval_seconds(&self) -> i64 {
        days_to_seconds(self.payment_interval_days)
    }

    pub fn is_past_due(&self, now: Timestamp) -> bool {
        self.due_date != 0 && now > self.due_date
    }

    /// Reset every balance and date, as on payoff.
    pub fn close(&mut self) {
        self.remaining_principal = Decimal::ZERO;
        self.unbilled_principal = Decimal::ZERO;
        self.fees_and_interest_due = Decimal::ZERO;
        self.total_due = Decimal::ZERO;
        self.remaining_periods = 0;
        self.missed_periods = 0;
        self.due_date = 0;
        self.state = CreditState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_state_codes() {
        assert_eq!(CreditState::Deleted.code(), 0);
        assert_eq!(CreditState::Requested.code(), 1);
        assert_eq!(CreditState::Approved.code(), 2);
        assert_eq!(CreditState::Closed.code(), 3);
        assert!(CreditState::Delayed.is_active());
        assert!(!CreditState::Approved.is_active());
        assert!(CreditState::Closed.is_available_for_request());
        assert!(!CreditState::Defaulted.is_available_for_request());
    }

    #[test]
    fn test_principal_due_clamped() {
        let mut cr = CreditRecord::requested("b", dec!(1000), 1200, 30, 12, CreditType::InterestOnly);
        cr.remaining_principal = dec!(400);
        cr.fees_and_interest_due = dec!(4);
        cr.total_due = dec!(4);
        assert_eq!(cr.principal_due(), dec!(0));
        cr.total_due = dec!(1000);
        assert_eq!(cr.principal_due(), dec!(400));
    }

    #[test]
    fn test_close_clears_balances() {
        let mut cr = CreditRecord::requested("b", dec!(1000), 1200, 30, 12, CreditType::InterestOnly);
        cr.remaining_principal = dec!(10);
        cr.total_due = dec!(3);
        cr.due_date = 99;
        cr.close();
        assert_eq!(cr.state, CreditState::Closed);
        assert_eq!(cr.remaining_principal, dec!(0));
        assert_eq!(cr.total_due, dec!(0));
        assert_eq!(cr.due_date, 0);
    }
}
