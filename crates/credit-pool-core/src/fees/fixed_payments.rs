//! Registered installment amounts for fixed-payment (amortizing) credit.
//!
//! Entries are keyed by `(term_months, apr_bps)` and store the monthly
//! installment for 1,000,000 units of principal. Lookups scale linearly and
//! truncate.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CreditPoolError;
use crate::time_value::pmt;
use crate::types::{bps_to_rate, Bps, Money, MONTHS_PER_YEAR};
use crate::CreditPoolResult;

/// Principal amount the registered installments are quoted against.
pub const REFERENCE_PRINCIPAL: Decimal = dec!(1_000_000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPaymentEntry {
    pub term_months: u32,
    pub apr_bps: Bps,
    pub payment: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FixedPaymentEntry>", into = "Vec<FixedPaymentEntry>")]
pub struct FixedPaymentTable {
    entries: BTreeMap<(u32, Bps), Money>,
}

impl FixedPaymentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) a single installment.
    pub fn add_fixed_payment(
        &mut self,
        term_months: u32,
        apr_bps: Bps,
        payment: Money,
    ) -> CreditPoolResult<()> {
        validate_entry(term_months, payment)?;
        self.entries.insert((term_months, apr_bps), payment);
        Ok(())
    }

    /// Register many installments at once. All three slices must have the
    /// same length; nothing is registered if any entry is invalid.
    pub fn add_batch_of_fixed_payments(
        &mut self,
        terms: &[u32],
        aprs: &[Bps],
        payments: &[Money],
    ) -> CreditPoolResult<()> {
        if terms.len() != aprs.len() || terms.len() != payments.len() {
            return Err(CreditPoolError::ArraySizeMismatch {
                terms: terms.len(),
                aprs: aprs.len(),
                payments: payments.len(),
            });
        }
        for (term, payment) in terms.iter().zip(payments) {
            validate_entry(*term, *payment)?;
        }
        for ((term, apr), payment) in terms.iter().zip(aprs).zip(payments) {
            self.entries.insert((*term, *apr), *payment);
        }
        Ok(())
    }

    /// Installment for `principal` at `apr_bps` over `term_months`.
    pub fn get_fixed_payment_amount(
        &self,
        principal: Money,
        apr_bps: Bps,
        term_months: u32,
    ) -> CreditPoolResult<Money> {
        let per_reference = self
            .entries
            .get(&(term_months, apr_bps))
            .ok_or(CreditPoolError::PriceNotFound {
                term_months,
                apr_bps,
            })?;
        Ok((principal * *per_reference / REFERENCE_PRINCIPAL).trunc())
    }

    pub fn contains(&self, term_months: u32, apr_bps: Bps) -> bool {
        self.entries.contains_key(&(term_months, apr_bps))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> Vec<FixedPaymentEntry> {
        self.entries
            .iter()
            .map(|(&(term_months, apr_bps), &payment)| FixedPaymentEntry {
                term_months,
                apr_bps,
                payment,
            })
            .collect()
    }

    /// Build a table for every `(term, apr)` combination from the standard
    /// annuity formula with monthly compounding.
    pub fn generate(terms: &[u32], aprs: &[Bps]) -> CreditPoolResult<Self> {
        let mut table = Self::new();
        let months = Decimal::from(MONTHS_PER_YEAR);
        for &term in terms {
            for &apr in aprs {
                let monthly_rate = bps_to_rate(apr) / months;
                let payment = pmt(monthly_rate, term, REFERENCE_PRINCIPAL)?.trunc();
                table.add_fixed_payment(term, apr, payment)?;
            }
        }
        Ok(table)
    }
}

impl From<Vec<FixedPaymentEntry>> for FixedPaymentTable {
    fn from(entries: Vec<FixedPaymentEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| ((e.term_months, e.apr_bps), e.payment))
                .collect(),
        }
    }
}

impl From<FixedPaymentTable> for Vec<FixedPaymentEntry> {
    fn from(table: FixedPaymentTable) -> Self {
        table.entries()
    }
}

fn validate_entry(term_months: u32, payment: Money) -> CreditPoolResult<()> {
    if term_months == 0 {
        return Err(CreditPoolError::InvalidInput {
            field: "term_months".into(),
            reason: "Term must be at least 1 month".into(),
        });
    }
    if payment <= Decimal::ZERO {
        return Err(CreditPoolError::InvalidInput {
            field: "payment".into(),
            reason: "Installment must be positive".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn registered() -> FixedPaymentTable {
        let mut table = FixedPaymentTable::new();
        table
            .add_batch_of_fixed_payments(
                &[24, 12, 24],
                &[500, 1025, 1000],
                &[dec!(43871), dec!(87916), dec!(46145)],
            )
            .unwrap();
        table
    }

    #[test]
    fn test_lookup_registered_values() {
        let table = registered();
        assert_eq!(
            table
                .get_fixed_payment_amount(dec!(1_000_000), 500, 24)
                .unwrap(),
            dec!(43871)
        );
        assert_eq!(
            table
                .get_fixed_payment_amount(dec!(1_000_000), 1025, 12)
                .unwrap(),
            dec!(87916)
        );
    }

    #[test]
    fn test_lookup_scales_and_truncates() {
        let table = registered();
        // 43871 * 0.5 = 21935.5 -> 21935
        assert_eq!(
            table.get_fixed_payment_amount(dec!(500_000), 500, 24).unwrap(),
            dec!(21935)
        );
    }

    #[test]
    fn test_missing_price() {
        let err = registered()
            .get_fixed_payment_amount(dec!(1_000_000), 900, 36)
            .unwrap_err();
        assert!(matches!(
            err,
            CreditPoolError::PriceNotFound {
                term_months: 36,
                apr_bps: 900
            }
        ));
    }

    #[test]
    fn test_batch_size_mismatch_registers_nothing() {
        let mut table = FixedPaymentTable::new();
        let err = table
            .add_batch_of_fixed_payments(&[24, 24], &[1000, 1025], &[dec!(46260)])
            .unwrap_err();
        assert!(matches!(
            err,
            CreditPoolError::ArraySizeMismatch {
                terms: 2,
                aprs: 2,
                payments: 1
            }
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_generate_matches_registered_24_month_price() {
        let table = FixedPaymentTable::generate(&[24], &[500]).unwrap();
        assert_eq!(
            table
                .get_fixed_payment_amount(dec!(1_000_000), 500, 24)
                .unwrap(),
            dec!(43871)
        );
    }

    #[test]
    fn test_serde_as_entry_list() {
        let table = registered();
        let json = serde_json::to_string(&table).unwrap();
        let back: FixedPaymentTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.len(), 3);
    }
}
